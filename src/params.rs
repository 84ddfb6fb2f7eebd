use crate::config::GeneratorConfig;
use crate::document::{sort_nodes, Comparator, Node};
use crate::naming::{eligible_attributes, nested_blocks};
use crate::schema::Block;

/// Parameters of the constructors generated for one schema block.
#[derive(Clone, Debug, PartialEq)]
pub struct ParamList {
    /// Constructor parameters, one per input attribute and nested block.
    /// Optional ones default to null.
    pub params: Vec<Node>,
    /// Object fields setting each Terraform field from its parameter.
    pub field_setters: Vec<Node>,
    /// Named arguments forwarding every parameter to another constructor.
    pub forwarding_args: Vec<Node>,
}

impl ParamList {
    /// Builds the parameter list for `block`, sorting all three lists with `cmp`.
    ///
    /// Nested blocks are always optional, whatever their `min_items`.
    pub fn new(config: &GeneratorConfig, block: &Block, cmp: Comparator) -> Self {
        let mut params = Vec::new();
        let mut field_setters = Vec::new();
        let mut forwarding_args = Vec::new();

        for (param, input) in eligible_attributes(config, block) {
            let mut node = Node::null(param.as_str());
            if input.attr.required {
                node = Node::required(node);
            }
            params.push(node);
            field_setters.push(Node::reference(input.tf_name, param.as_str()));
            forwarding_args.push(Node::reference(param.as_str(), param.as_str()));
        }

        for (param, input) in nested_blocks(config, block) {
            params.push(Node::null(param.as_str()));
            field_setters.push(Node::reference(input.tf_name, param.as_str()));
            forwarding_args.push(Node::reference(param.as_str(), param.as_str()));
        }

        sort_nodes(&mut params, cmp);
        sort_nodes(&mut field_setters, cmp);
        sort_nodes(&mut forwarding_args, cmp);

        Self {
            params,
            field_setters,
            forwarding_args,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::document::required_then_name;
    use crate::schema::{Attribute, NestedBlock, NestingMode};

    fn config() -> GeneratorConfig {
        GeneratorConfig::new("test".to_string())
    }

    fn attr(required: bool) -> Attribute {
        Attribute {
            required,
            optional: !required,
            ..Default::default()
        }
    }

    fn block() -> Block {
        let mut block = Block::default();
        block.attributes.insert("c".into(), attr(false));
        block.attributes.insert("b".into(), attr(false));
        block.attributes.insert("a".into(), attr(true));
        block.attributes.insert("local".into(), attr(false));
        block.attributes.insert(
            "id".into(),
            Attribute {
                computed: true,
                optional: true,
                ..Default::default()
            },
        );
        block.nested_blocks.insert(
            "aa_block".into(),
            NestedBlock {
                nesting_mode: NestingMode::List,
                block: Block::default(),
                min_items: Some(1),
                max_items: None,
            },
        );
        block
    }

    fn names(nodes: &[Node]) -> Vec<&str> {
        nodes.iter().map(Node::name).collect()
    }

    #[test]
    fn test_required_params_first() {
        let params = ParamList::new(&config(), &block(), required_then_name);
        assert_eq!(names(&params.params), vec!["a", "aa_block", "b", "c", "local_"]);
        assert!(params.params[0].is_required());
        assert!(params.params[1..].iter().all(|p| !p.is_required()));
        assert!(params.params[1..]
            .iter()
            .all(|p| matches!(p.unwrap_markers(), Node::Null { .. })));
    }

    #[test]
    fn test_field_setters_keep_original_names() {
        let params = ParamList::new(&config(), &block(), required_then_name);
        assert!(params
            .field_setters
            .contains(&Node::reference("local", "local_")));
        assert!(params
            .forwarding_args
            .contains(&Node::reference("local_", "local_")));
        assert_eq!(
            names(&params.field_setters),
            vec!["a", "aa_block", "b", "c", "local"]
        );
        assert_eq!(params.params.len(), params.forwarding_args.len());
    }

    #[test]
    fn test_nested_blocks_never_required() {
        let params = ParamList::new(&config(), &block(), required_then_name);
        let aa = params.params.iter().find(|p| p.name() == "aa_block").unwrap();
        assert!(!aa.is_required());
    }

    #[test]
    fn test_idempotent() {
        let config = config();
        let block = block();
        assert_eq!(
            ParamList::new(&config, &block, required_then_name),
            ParamList::new(&config, &block, required_then_name)
        );
    }

    #[test]
    fn test_empty_block() {
        let params = ParamList::new(&config(), &Block::default(), required_then_name);
        assert!(params.params.is_empty());
        assert!(params.field_setters.is_empty());
        assert!(params.forwarding_args.is_empty());
    }
}
