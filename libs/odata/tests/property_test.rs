//! Property-based tests using QuickCheck

use ferrum_odata::value::Value;
use ferrum_odata::{ExpressionLexer, KeyDescriptor, TokenId};
use quickcheck::{QuickCheck, TestResult};

mod test_support;

use test_support::{compile_filter, parse_filter, resolve};

/// Property: the lexer returns a token stream or an error for any input
#[test]
fn prop_lexer_never_panics() {
    fn prop(s: String) -> TestResult {
        let mut lexer = match ExpressionLexer::new(&s) {
            Ok(lexer) => lexer,
            Err(_) => return TestResult::passed(),
        };

        // Every token consumes at least one character
        for _ in 0..=s.chars().count() {
            match lexer.next_token() {
                Ok(token) if token.id == TokenId::End => return TestResult::passed(),
                Ok(_) => {}
                Err(_) => return TestResult::passed(),
            }
        }
        TestResult::failed()
    }

    QuickCheck::new()
        .tests(100)
        .quickcheck(prop as fn(String) -> TestResult);
}

/// Property: a quoted string key survives quoting and unquoting
#[test]
fn prop_string_key_roundtrip() {
    fn prop(s: String) -> TestResult {
        let predicate = format!("'{}'", s.replace('\'', "''"));
        match KeyDescriptor::try_parse_keys_from_key_predicate(&predicate) {
            Some(KeyDescriptor::Positional(values)) => {
                TestResult::from_bool(values.len() == 1 && values[0].value == Value::String(s))
            }
            _ => TestResult::failed(),
        }
    }

    QuickCheck::new()
        .tests(100)
        .quickcheck(prop as fn(String) -> TestResult);
}

/// Property: any Int32 compares against an Int32 property unchanged
#[test]
fn prop_int32_literal_in_filter() {
    fn prop(n: i32) -> TestResult {
        match compile_filter("Customer", &format!("Rating eq {}", n)) {
            Ok(code) => TestResult::from_bool(code == format!("($lt->Rating == {})", n)),
            Err(_) => TestResult::failed(),
        }
    }

    QuickCheck::new()
        .tests(100)
        .quickcheck(prop as fn(i32) -> TestResult);
}

/// Property: any Int32 key addresses exactly one order
#[test]
fn prop_int32_key_segment() {
    fn prop(n: i32) -> TestResult {
        match resolve(&[&format!("Orders({})", n)]) {
            Ok(chain) => {
                let segment = chain.first().unwrap();
                TestResult::from_bool(
                    segment.is_single_result
                        && segment.key_descriptor.as_ref().map(|k| k.to_string())
                            == Some(format!("OrderID={}", n)),
                )
            }
            Err(_) => TestResult::failed(),
        }
    }

    QuickCheck::new()
        .tests(100)
        .quickcheck(prop as fn(i32) -> TestResult);
}

/// Property: redundant parentheses do not change the compiled predicate
#[test]
fn prop_redundant_parentheses() {
    let test_cases = vec![
        ("Rating add 1 eq 2", "(Rating add 1) eq 2"),
        ("Rating add 2 mul 3 eq 8", "Rating add (2 mul 3) eq 8"),
        ("Rating sub 1 sub 1 eq 0", "(Rating sub 1) sub 1 eq 0"),
        ("not Active and Active", "(not Active) and Active"),
        ("Active or Active and Active", "Active or (Active and Active)"),
        ("Rating gt 1 and Rating lt 5", "(Rating gt 1) and (Rating lt 5)"),
        ("-Rating eq 1", "(-Rating) eq 1"),
        ("length(CompanyName) gt 2", "(length(CompanyName)) gt 2"),
    ];

    for (plain, parenthesized) in test_cases {
        let left = compile_filter("Customer", plain).unwrap();
        let right = compile_filter("Customer", parenthesized).unwrap();
        assert_eq!(left, right, "{} should compile like {}", plain, parenthesized);
    }
}

/// Property: swapping the operands of eq keeps the expression type
/// Using manual test cases to control operand types
#[test]
fn prop_equality_symmetric_typing() {
    let test_cases = vec![
        ("Rating", "1"),
        ("Rating", "1L"),
        ("Freight", "1.5"),
        ("Price", "2M"),
        ("CompanyName", "'x'"),
        ("Since", "datetime'2000-01-01T00:00'"),
        ("Active", "true"),
    ];

    for (property, literal) in test_cases {
        let type_name = if property == "Freight" || property == "Price" {
            "Order"
        } else {
            "Customer"
        };
        let forward = parse_filter(type_name, &format!("{} eq {}", property, literal));
        let backward = parse_filter(type_name, &format!("{} eq {}", literal, property));
        assert!(forward.is_ok(), "{} eq {}", property, literal);
        assert!(backward.is_ok(), "{} eq {}", literal, property);
        assert_eq!(forward.unwrap().ty(), backward.unwrap().ty());
    }
}

/// Property: parsing is deterministic
#[test]
fn prop_parse_deterministic() {
    let expressions = vec![
        "Rating gt 2 and startswith(CompanyName, 'A')",
        "Address/LineNumber add 4 eq 8",
        "not (Country eq null)",
        "year(Since) eq 2001 or Active",
    ];

    for expr in expressions {
        let first = parse_filter("Customer", expr).unwrap();
        let second = parse_filter("Customer", expr).unwrap();
        assert_eq!(first, second, "{}", expr);
    }
}
