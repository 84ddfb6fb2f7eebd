//! Generators for the `with<Field>` and `with<Field>Mixin` functions.
//!
//! A mutator returns a partial document meant to be merged into the root
//! document with `+`. The bare variant replaces the field value on the
//! labelled instance; the mixin variant merges into it.

use crate::config::GeneratorConfig;
use crate::document::Node;
use crate::error::{Error, Result};
use crate::naming::{with_fn_name, BlockKind, CollectionKind};

const VALUE_PARAM: &str = "value";

/// Builds the mutator for `field` on instances of `type_name`.
///
/// `field` is the Terraform field name, used both for the function name and
/// for the key that is set. `collection_kind` only matters for mixins: maps
/// are merged as objects, lists and sets are concatenated after wrapping a
/// non-array value in a single element list.
pub fn with_attribute_or_block_fn(
    config: &GeneratorConfig,
    kind: BlockKind,
    type_name: &str,
    field: &str,
    is_mixin: bool,
    collection_kind: CollectionKind,
) -> Result<Node> {
    let (label, inject) = match (kind.label_arg(), kind.inject_attr_name()) {
        (Some(label), Some(inject)) => (label, inject),
        _ => {
            return Err(Error::UnsupportedBlockKind {
                kind,
                operation: "mutator generation",
            })
        }
    };

    let value = Node::reference(field, VALUE_PARAM);
    let update = if !is_mixin {
        value
    } else {
        match collection_kind {
            CollectionKind::Map => Node::merge(value),
            CollectionKind::ListOrSet => Node::merge(Node::conditional(
                field,
                Node::call(
                    "",
                    "std.isArray",
                    vec![Node::reference("v", VALUE_PARAM)],
                ),
                Node::reference("", VALUE_PARAM),
                Node::list("", vec![Node::reference("", VALUE_PARAM)]),
            )),
            CollectionKind::Scalar => {
                return Err(Error::UnsupportedMixin {
                    field: field.to_string(),
                    kind: collection_kind,
                })
            }
        }
    };

    let body = Node::object(
        "",
        vec![Node::merge(Node::object(
            inject,
            vec![Node::merge(Node::object(
                type_name,
                vec![Node::merge(Node::computed_object(label, vec![update]))],
            ))],
        ))],
    );

    Ok(Node::function(
        with_fn_name(config, field, is_mixin),
        vec![
            Node::required(Node::string(label, "")),
            Node::required(Node::string(VALUE_PARAM, "")),
        ],
        body,
    ))
}
