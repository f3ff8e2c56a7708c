//! jq preprocessing of input documents.
use anyhow::{Result, anyhow};
use jaq_core::{Compiler, Ctx, Filter, Native, RcIter, load};
use jaq_json::Val;
use serde_json::Value;

/// Run a jq filter over one document; every output becomes its own document.
pub fn run_jaq(filter_src: &str, input: &Value) -> Result<Vec<Value>> {
    let filter = compile(filter_src)?;
    let inputs = RcIter::new(core::iter::empty());
    filter
        .run((Ctx::new([], &inputs), Val::from(input.clone())))
        .enumerate()
        .map(|(i, output)| {
            output
                .map(Value::from)
                .map_err(|e| anyhow!("jq output #{i} failed: {e}"))
        })
        .collect()
}

fn compile(src: &str) -> Result<Filter<Native<Val>>> {
    let loader = load::Loader::new(jaq_std::defs().chain(jaq_json::defs()));
    let arena = load::Arena::default();
    let modules = loader
        .load(&arena, load::File { code: src, path: () })
        .map_err(|errs| {
            let reports: Vec<String> = errs.iter().map(|(_, err)| format!("{err:?}")).collect();
            anyhow!("cannot parse jq expression `{src}`: {}", reports.join("; "))
        })?;
    Compiler::default()
        .with_funs(jaq_std::funs().chain(jaq_json::funs()))
        .compile(modules)
        .map_err(|errs| {
            let names: Vec<&str> = errs
                .iter()
                .flat_map(|(_, undefined)| undefined.iter().map(|(name, _)| *name))
                .collect();
            anyhow!("undefined in jq expression `{src}`: {}", names.join(", "))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn each_output_is_a_document() {
        let docs = run_jaq(".items[]", &json!({ "items": [{ "id": 1 }, { "id": 2 }] })).unwrap();
        assert_eq!(docs, vec![json!({ "id": 1 }), json!({ "id": 2 })]);
    }

    #[test]
    fn outputs_keep_their_json_types() {
        let docs = run_jaq("{ n: .a, s: (.a | tostring), f: 1.5, z: null }", &json!({ "a": 3 })).unwrap();
        assert_eq!(docs, vec![json!({ "n": 3, "s": "3", "f": 1.5, "z": null })]);
    }

    #[test]
    fn bad_filters_are_errors() {
        assert!(run_jaq(".items[", &json!({})).is_err());
        let undefined = run_jaq("nope_not_defined", &json!({})).unwrap_err();
        assert!(undefined.to_string().contains("nope_not_defined"), "{undefined}");
        assert!(run_jaq("error(\"boom\")", &json!({})).is_err());
    }
}
