//! Property-based tests for ordering, naming, and the contract pipeline
//!
//! Covers the invariants generated output depends on: byte-wise stable
//! ordering, instance name derivation, source path reduction, and that
//! post-processing a generated contract is a fixed point.

use grpc_contract_core::ordering::{is_sorted_rendered, sort_rendered};
use grpc_contract_core::naming::derive_instance_name;
use grpc_contract_core::{
    ContractModel, GoMethod, Generator, ImportTable, Renderable, postprocess,
};
use proptest::prelude::*;
use std::borrow::Cow;

const GO_KEYWORDS: &[&str] = &[
    "break", "case", "chan", "const", "continue", "default", "defer", "else", "fallthrough",
    "for", "func", "go", "goto", "if", "import", "interface", "map", "package", "range",
    "return", "select", "struct", "switch", "type", "var",
];

/// Renders as `text`; `tag` records the input position.
#[derive(Debug, Clone)]
struct Tagged {
    text: String,
    tag: usize,
}

impl Renderable for Tagged {
    fn rendered_form(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.text)
    }
}

// Strategy: short strings from a small alphabet so duplicates are common
fn arb_rendered() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[aAbB_é]{0,3}", 0..24)
}

// Strategy: exported Go identifiers whose instance name neither is a keyword
// nor shadows a known package qualifier
fn arb_contract_name() -> impl Strategy<Value = String> {
    let table = ImportTable::standard();
    "[A-Z][A-Za-z0-9]{0,12}".prop_filter("instance name must stay free", move |name| {
        derive_instance_name(name).is_ok_and(|lower| {
            !GO_KEYWORDS.contains(&lower.as_str()) && table.resolve(&lower).is_none()
        })
    })
}

fn arb_package() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,8}".prop_filter("package must not be a keyword", |p| {
        !GO_KEYWORDS.contains(&p.as_str())
    })
}

proptest! {
    /// Property: sorting yields byte-wise non-decreasing order
    #[test]
    fn proptest_sort_is_byte_ordered(items in arb_rendered()) {
        let mut sorted = items.clone();
        sort_rendered(&mut sorted);

        prop_assert!(is_sorted_rendered(&sorted));
        for pair in sorted.windows(2) {
            prop_assert!(pair[0].as_bytes() <= pair[1].as_bytes());
        }
    }

    /// Property: items that render identically keep their input order
    #[test]
    fn proptest_sort_is_stable(items in arb_rendered()) {
        let mut tagged: Vec<Tagged> = items
            .into_iter()
            .enumerate()
            .map(|(tag, text)| Tagged { text, tag })
            .collect();

        sort_rendered(&mut tagged);

        for pair in tagged.windows(2) {
            if pair[0].text == pair[1].text {
                prop_assert!(pair[0].tag < pair[1].tag);
            }
        }
    }

    /// Property: sorting twice equals sorting once
    #[test]
    fn proptest_sort_is_idempotent(items in arb_rendered()) {
        let mut once = items;
        sort_rendered(&mut once);
        let mut twice = once.clone();
        sort_rendered(&mut twice);

        prop_assert_eq!(once, twice);
    }

    /// Property: only the first character changes, and it is lower-cased
    #[test]
    fn proptest_instance_name_lowers_first_char(name in "\\PC{1,16}") {
        let derived = derive_instance_name(&name).unwrap();

        let mut chars = name.chars();
        let first = chars.next().unwrap();
        let expected: String = first.to_lowercase().chain(chars).collect();
        prop_assert_eq!(derived, expected);
    }

    /// Property: source paths reduce to the text after the last separator
    #[test]
    fn proptest_source_path_keeps_file_name(
        dirs in prop::collection::vec("[a-z0-9 ._-]{1,8}", 0..4),
        separator in prop::sample::select(vec!['/', '\\']),
        file in "[A-Za-z0-9_.]{1,12}",
    ) {
        let mut path = String::new();
        for dir in &dirs {
            path.push_str(dir);
            path.push(separator);
        }
        path.push_str(&file);

        let model = ContractModel::new("mypkg", "Token", [path.as_str()]).unwrap();

        prop_assert_eq!(model.sources(), [file]);
    }

    /// Property: exactly `<Name>Server` is the server interface
    #[test]
    fn proptest_server_interface_is_exact(name in arb_contract_name(), other in "\\PC{0,20}") {
        let model = ContractModel::new("mypkg", name.as_str(), Vec::<String>::new()).unwrap();
        let server = format!("{name}Server");

        prop_assert!(model.is_server_interface(&server));
        prop_assert_eq!(model.is_server_interface(&other), other == server);
    }

    /// Property: generated contracts are already canonical
    #[test]
    fn proptest_generated_contract_is_fixed_point(
        package in arb_package(),
        name in arb_contract_name(),
        methods in prop::collection::vec("[A-Z][a-zA-Z]{0,8}", 0..4),
    ) {
        let generator = Generator::new().unwrap();
        let model = ContractModel::new(package.as_str(), name.as_str(), ["/a/Contract.sol"])
            .unwrap()
            .with_methods(methods.iter().map(|m| {
                GoMethod::new(format!(
                    "func (s *impl) {m}(ctx context.Context) error {{\n  return nil;\n}}"
                ))
            }));

        let file = generator.generate_contract(model, ".", "out.go").unwrap();
        let text = String::from_utf8(file.contents.clone()).unwrap();

        prop_assert_eq!(postprocess(&file.contents).unwrap(), file.contents);
        let closes_block = text.ends_with("}\n");
        prop_assert!(closes_block);
        let package_line = format!("\npackage {package}\n");
        let constructor = format!("func New{name}Server(");
        prop_assert!(text.contains(&package_line));
        prop_assert!(text.contains(&constructor));
        prop_assert_eq!(methods.is_empty(), !text.contains("\t\"context\"\n"));
    }
}
