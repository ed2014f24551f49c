#![allow(non_snake_case)]

use super::*;
use crate::descriptor::{GoMethod, Message, MessageField, RpcMethod};
use crate::error::GenerateError;
use crate::sink::MemorySink;
use std::path::Path;

const TOKEN_SERVER: &str = "\
// Automatically generated by grpc-contract. DO NOT EDIT!
// sources:
//     Token.sol
//     Token.sol

package mypkg

import (
\t\"github.com/ethereum/go-ethereum/accounts/abi/bind\"
\t\"github.com/ethereum/go-ethereum/common\"
)

type token struct {
\tcontract       *Token
\ttransactOptsFn TransactOptsFn
}

func NewTokenServer(address common.Address, backend bind.ContractBackend, transactOptsFn TransactOptsFn) TokenServer {
\tcontract, _ := NewToken(address, backend)
\tservice := &token{
\t\tcontract:       contract,
\t\ttransactOptsFn: transactOptsFn,
\t}
\tif transactOptsFn == nil {
\t\tservice.transactOptsFn = DefaultTransactOptsFn
\t}
\treturn service
}
";

const BALANCE_OF: &str = "\
func (s *token) BalanceOf(ctx context.Context, req *pb.BalanceOfReq) (*pb.BalanceOfResp, error) {
    balance, err := s.contract.BalanceOf(&bind.CallOpts{Context: ctx}, common.HexToAddress(req.Owner));
    if err != nil {
        return nil, err
    }
    return &pb.BalanceOfResp{Balance: balance.String()}, nil
}";

fn token_model() -> ContractModel {
    ContractModel::new("mypkg", "Token", ["/a/b/Token.sol", "/x/Token.sol"]).unwrap()
}

fn pb_generator() -> Generator {
    let mut config = GeneratorConfig::default();
    config
        .imports
        .insert("pb".to_string(), "example.com/gen/tokenpb".to_string());
    Generator::with_config(&config).unwrap()
}

// Contracts

#[test]
fn Generator___empty_contract___renders_canonical_server() {
    let generator = Generator::new().unwrap();

    let file = generator.generate_contract(token_model(), "out", "token.go").unwrap();

    assert_eq!(file.path(), Path::new("out").join("token.go"));
    assert_eq!(String::from_utf8(file.contents).unwrap(), TOKEN_SERVER);
}

#[test]
fn Generator___contract_with_method___adds_method_imports() {
    let generator = pb_generator();
    let model = token_model().with_methods([GoMethod::new(BALANCE_OF)]);

    let file = generator.generate_contract(model, "out", "token.go").unwrap();
    let text = String::from_utf8(file.contents).unwrap();

    assert!(text.contains(
        "import (\n\
         \t\"context\"\n\
         \n\
         \tpb \"example.com/gen/tokenpb\"\n\
         \t\"github.com/ethereum/go-ethereum/accounts/abi/bind\"\n\
         \t\"github.com/ethereum/go-ethereum/common\"\n\
         )\n"
    ));
    assert!(text.contains(
        "\treturn service\n\
         }\n\
         \n\
         func (s *token) BalanceOf(ctx context.Context, req *pb.BalanceOfReq) (*pb.BalanceOfResp, error) {\n\
         \tbalance, err := s.contract.BalanceOf(&bind.CallOpts{Context: ctx}, common.HexToAddress(req.Owner))\n\
         \tif err != nil {\n\
         \t\treturn nil, err\n\
         \t}\n\
         \treturn &pb.BalanceOfResp{Balance: balance.String()}, nil\n\
         }\n"
    ));
    assert!(text.ends_with("}\n") && !text.ends_with("\n\n"));
}

#[test]
fn Generator___methods___emitted_in_byte_order() {
    let generator = Generator::new().unwrap();
    let model = token_model().with_methods([
        GoMethod::new("func (s *token) b() {}"),
        GoMethod::new("func (s *token) B() {}"),
        GoMethod::new("func (s *token) a() {}"),
    ]);

    let file = generator.generate_contract(model, ".", "token.go").unwrap();
    let text = String::from_utf8(file.contents).unwrap();

    let upper = text.find("B() {}").unwrap();
    let lower_a = text.find("a() {}").unwrap();
    let lower_b = text.find("b() {}").unwrap();
    assert!(upper < lower_a && lower_a < lower_b);
}

#[test]
fn Generator___config_resolver___used_when_model_sets_none() {
    let config = GeneratorConfig {
        default_transact_opts_fn: "KeystoreTransactOpts".to_string(),
        ..GeneratorConfig::default()
    };
    let generator = Generator::with_config(&config).unwrap();

    let file = generator.generate_contract(token_model(), ".", "token.go").unwrap();

    assert!(String::from_utf8(file.contents)
        .unwrap()
        .contains("\t\tservice.transactOptsFn = KeystoreTransactOpts\n"));
    assert_eq!(generator.default_transact_opts_fn(), "KeystoreTransactOpts");
}

#[test]
fn Generator___model_resolver___wins_over_config() {
    let generator = Generator::new().unwrap();
    let model = token_model().with_transact_opts_fn("LedgerTransactOpts").unwrap();

    let file = generator.generate_contract(model, ".", "token.go").unwrap();

    assert!(String::from_utf8(file.contents)
        .unwrap()
        .contains("service.transactOptsFn = LedgerTransactOpts\n"));
}

#[test]
fn Generator___with_config___rejects_invalid_config() {
    let config = GeneratorConfig {
        default_transact_opts_fn: String::new(),
        ..GeneratorConfig::default()
    };

    let err = Generator::with_config(&config).unwrap_err();

    assert!(matches!(err, GenerateError::ConfigError(_)));
}

// Failures

#[test]
fn Generator___placeholder_in_method___is_malformed_and_not_emitted() {
    let generator = Generator::new().unwrap();
    let model = token_model().with_methods([GoMethod::new(
        "func (s *token) Name() string {\n\treturn {{ name }}\n}",
    )]);
    let mut sink = MemorySink::new();

    let err = generator
        .emit_contract(model, "out", "token.go", &mut sink)
        .unwrap_err();

    match err {
        GenerateError::MalformedSource { reason, excerpt, .. } => {
            assert_eq!(reason, "unresolved template placeholder `{{`");
            assert_eq!(excerpt, "return {{ name }}");
        }
        other => panic!("expected MalformedSource, got {other:?}"),
    }
    assert!(sink.files().is_empty());
}

#[test]
fn Generator___custom_template_missing_field___is_render_defect() {
    let generator = Generator::new()
        .unwrap()
        .with_contract_template(TemplateRenderer::new("custom.go", "package {{ pkg }}").unwrap());

    let err = generator.generate_contract(token_model(), ".", "x.go").unwrap_err();

    assert!(matches!(err, GenerateError::RenderDefect { ref template, .. } if template == "custom.go"));
}

#[test]
fn Generator___custom_template___is_post_processed() {
    let generator = Generator::new().unwrap().with_contract_template(
        TemplateRenderer::new("custom.go", "package {{ package }};\nvar Big = big.NewInt(1);\n")
            .unwrap(),
    );

    let file = generator.generate_contract(token_model(), ".", "x.go").unwrap();

    assert_eq!(
        String::from_utf8(file.contents).unwrap(),
        "package mypkg\n\nimport \"math/big\"\n\nvar Big = big.NewInt(1)\n"
    );
}

// Schemas

#[test]
fn Generator___schema___is_not_post_processed() {
    let generator = Generator::new().unwrap();
    let mut model = ServiceModel::new("token", "Token").unwrap();
    model.add_message(
        Message::new("BalanceOfReq").with_field(MessageField::new("owner", "string", 1)),
    );
    model.push_method(RpcMethod::new("BalanceOf", "BalanceOfReq", "BalanceOfResp"));

    let file = generator.generate_schema(&model, "proto", "token.proto").unwrap();
    let text = String::from_utf8(file.contents).unwrap();

    assert!(text.starts_with("syntax = \"proto3\";\n\npackage token;\n"));
    assert!(text.contains("message BalanceOfReq {\n    string owner = 1;\n}\n"));
    assert!(text.contains("    rpc BalanceOf(BalanceOfReq) returns (BalanceOfResp) {}\n"));
}

#[test]
fn Generator___schema___independent_of_insertion_order() {
    let generator = Generator::new().unwrap();
    let service = |rpcs: [(&str, &str); 2], events: [&str; 2]| {
        let mut model = ServiceModel::new("token", "Token").unwrap();
        for (name, request) in rpcs {
            model.push_method(RpcMethod::new(name, request, "TransactionResp"));
        }
        for name in events {
            model.push_event(RpcMethod::new(name, format!("{name}Event"), "Empty"));
        }
        model
    };
    let forward = service([("Approve", "ApproveReq"), ("Transfer", "TransferReq")], ["Paused", "Unpaused"]);
    let reversed = service([("Transfer", "TransferReq"), ("Approve", "ApproveReq")], ["Unpaused", "Paused"]);

    let a = generator.generate_schema(&forward, ".", "token.proto").unwrap();
    let b = generator.generate_schema(&reversed, ".", "token.proto").unwrap();

    assert_eq!(a.contents, b.contents);
    let text = String::from_utf8(a.contents).unwrap();
    assert!(text.find("rpc Approve(").unwrap() < text.find("rpc Transfer(").unwrap());
}

#[test]
fn Generator___emit___hands_both_files_to_sink() {
    let generator = Generator::new().unwrap();
    let service = ServiceModel::new("token", "Token").unwrap();
    let mut sink = MemorySink::new();

    generator
        .emit_contract(token_model(), "out", "token.go", &mut sink)
        .unwrap();
    generator
        .emit_schema(&service, "out", "token.proto", &mut sink)
        .unwrap();

    assert_eq!(sink.files().len(), 2);
    assert!(sink.get(Path::new("out").join("token.proto")).is_some());
    assert_eq!(
        sink.get(Path::new("out").join("token.go")).unwrap().contents,
        TOKEN_SERVER.as_bytes()
    );
}

#[test]
fn Generator___unicode_contract_name___generates() {
    let generator = Generator::new().unwrap();
    let model = ContractModel::new("mypkg", "Größe", ["Größe.sol"]).unwrap();

    let file = generator.generate_contract(model, ".", "größe.go").unwrap();
    let text = String::from_utf8(file.contents).unwrap();

    assert!(text.contains("type größe struct {\n"));
    assert!(text.contains("func NewGrößeServer("));
}

#[test]
fn Generator___is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}

    assert_send_sync::<Generator>();
}
