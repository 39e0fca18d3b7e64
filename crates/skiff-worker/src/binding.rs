//! Binding resolution for invocations.
//!
//! The worker only knows how to populate one kind of output (`http`) and
//! how to pass one kind of input (HTTP parameters). Resolution is
//! asymmetric: the first eligible output binding is taken, while the last
//! HTTP-shaped input wins.

use skiff_proto::{Direction, HttpParams, ParameterBinding};

use crate::error::InvocationError;
use crate::registry::{Binding, FunctionMetadata};

/// Binding type tag the worker can populate.
pub const HTTP_BINDING_TYPE: &str = "http";

/// Status code written to the resolved output binding.
pub const HTTP_OK: u16 = 200;

/// Result of resolving an invocation against its function's bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedBindings<'a> {
    /// Output binding that receives the result.
    pub output: &'a Binding,

    /// Single argument for the script, if any input was HTTP-shaped.
    pub argument: Option<&'a HttpParams>,
}

/// Resolves the output binding and the script argument.
///
/// Fails with [`InvocationError::NoHttpOutputBinding`] when the function
/// declares no out binding of type `http`; inputs are not inspected in that
/// case.
pub fn resolve<'a>(
    metadata: &'a FunctionMetadata,
    input_data: &'a [ParameterBinding],
) -> Result<ResolvedBindings<'a>, InvocationError> {
    let output = output_binding(metadata).ok_or(InvocationError::NoHttpOutputBinding)?;
    Ok(ResolvedBindings {
        output,
        argument: input_argument(input_data),
    })
}

/// First binding, in declaration order, that is `out` and of type `http`.
#[must_use]
pub fn output_binding(metadata: &FunctionMetadata) -> Option<&Binding> {
    metadata
        .bindings
        .iter()
        .find(|b| b.direction == Direction::Out && b.binding_type == HTTP_BINDING_TYPE)
}

/// Parameters of the last HTTP-shaped input value.
#[must_use]
pub fn input_argument(input_data: &[ParameterBinding]) -> Option<&HttpParams> {
    input_data
        .iter()
        .filter_map(|input| input.data.as_ref()?.as_http())
        .map(|http| &http.params)
        .last()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use skiff_proto::{RpcFunctionMetadata, RpcHttp, TypedData};

    fn function(bindings: &[(&str, Direction, &str)]) -> FunctionMetadata {
        bindings
            .iter()
            .fold(
                RpcFunctionMetadata::new("fn", "/fn/run.ps1"),
                |meta, (name, direction, kind)| meta.with_binding(*name, *direction, *kind),
            )
            .into()
    }

    fn http_input(name: &str, params: &[(&str, &str)]) -> ParameterBinding {
        let http = params
            .iter()
            .fold(RpcHttp::request("GET", "/api/fn"), |http, (k, v)| {
                http.with_param(*k, *v)
            });
        ParameterBinding::new(name, TypedData::Http(http))
    }

    #[test]
    fn picks_http_out_binding() {
        let meta = function(&[("req", Direction::In, "http"), ("res", Direction::Out, "http")]);
        assert_eq!(output_binding(&meta).map(|b| b.name.as_str()), Some("res"));
    }

    #[test]
    fn first_eligible_output_wins() {
        let meta = function(&[
            ("queue", Direction::Out, "queue"),
            ("first", Direction::Out, "http"),
            ("second", Direction::Out, "http"),
        ]);
        assert_eq!(output_binding(&meta).map(|b| b.name.as_str()), Some("first"));
    }

    #[test]
    fn input_http_binding_is_not_an_output() {
        let meta = function(&[("req", Direction::In, "http")]);
        assert!(output_binding(&meta).is_none());
    }

    #[test]
    fn type_tag_must_match_exactly() {
        let meta = function(&[("res", Direction::Out, "HTTP"), ("trig", Direction::Out, "httpTrigger")]);
        assert!(output_binding(&meta).is_none());
    }

    #[test]
    fn last_http_input_wins() {
        let inputs = vec![
            http_input("first", &[("name", "alpha")]),
            ParameterBinding::new("blob", TypedData::Bytes(vec![1, 2, 3])),
            http_input("second", &[("name", "beta")]),
            ParameterBinding {
                name: "empty".into(),
                data: None,
            },
        ];

        let params = input_argument(&inputs).unwrap();
        assert_eq!(params, &vec![("name".to_owned(), "beta".to_owned())]);
    }

    #[test]
    fn no_http_input_means_no_argument() {
        let inputs = vec![ParameterBinding::new("msg", TypedData::String("hi".into()))];
        assert!(input_argument(&inputs).is_none());
        assert!(input_argument(&[]).is_none());
    }

    #[test]
    fn empty_params_still_count_as_an_argument() {
        let inputs = vec![http_input("req", &[])];
        assert_eq!(input_argument(&inputs), Some(&Vec::new()));
    }

    #[test]
    fn resolve_fails_without_output() {
        let meta = function(&[("req", Direction::In, "http")]);
        let inputs = vec![http_input("req", &[("name", "world")])];

        assert!(matches!(
            resolve(&meta, &inputs),
            Err(InvocationError::NoHttpOutputBinding)
        ));
    }

    #[test]
    fn resolve_returns_output_and_argument() {
        let meta = function(&[("req", Direction::In, "http"), ("res", Direction::Out, "http")]);
        let inputs = vec![http_input("req", &[("name", "world")])];

        let resolved = resolve(&meta, &inputs).unwrap();
        assert_eq!(resolved.output.name, "res");
        assert_eq!(
            resolved.argument,
            Some(&vec![("name".to_owned(), "world".to_owned())])
        );
    }
}
