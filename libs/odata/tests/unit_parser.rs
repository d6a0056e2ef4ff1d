//! Unit tests for the expression parser and type checker

use ferrum_edm::EdmPrimitiveType;
use ferrum_odata::ast::{ArithmeticOp, Expression, LogicalOp, RelationalOp, UnaryOp};
use ferrum_odata::functions::FunctionId;
use ferrum_odata::value::Value;
use ferrum_odata::{Error, ExpressionParser, ParserOptions};

mod test_support;

use test_support::{filter_parser, metadata, parse_expression, parse_filter, resource_type};

fn function_id(expression: &Expression) -> Option<FunctionId> {
    match expression {
        Expression::FunctionCall { function, .. } => Some(function.id),
        _ => None,
    }
}

// ============================================================================
// Literals and arithmetic
// ============================================================================

#[test]
fn test_arithmetic_promotes_to_double() {
    let expr = parse_expression("Customer", "1 sub 2.5").unwrap();
    let Expression::Arithmetic {
        op,
        left,
        right,
        ty,
    } = expr
    else {
        panic!("expected arithmetic, got {:?}", expr);
    };
    assert_eq!(op, ArithmeticOp::Sub);
    assert_eq!(ty, EdmPrimitiveType::Double);
    match (*left, *right) {
        (Expression::Constant(l), Expression::Constant(r)) => {
            assert_eq!(l.ty, EdmPrimitiveType::Double);
            assert_eq!(l.value, Value::Double(1.0));
            assert_eq!(l.text, "1");
            assert_eq!(r.ty, EdmPrimitiveType::Double);
        }
        other => panic!("expected constants, got {:?}", other),
    }
}

#[test]
fn test_single_and_decimal_are_incompatible() {
    let err = parse_expression("Customer", "1F add 2M").unwrap_err();
    assert!(matches!(err, Error::Type { .. }));
    assert_eq!(
        err.message(),
        "Operator 'add' incompatible with operand types Edm.Single and Edm.Decimal"
    );

    let err = parse_filter("Order", "Price eq 1.5").unwrap_err();
    assert_eq!(
        err.message(),
        "Operator 'eq' incompatible with operand types Edm.Decimal and Edm.Double"
    );
}

#[test]
fn test_decimal_accepts_integral_operands() {
    let expr = parse_filter("Order", "Price gt 10L").unwrap();
    let Expression::Relational { right, .. } = expr else {
        panic!("expected relational");
    };
    assert_eq!(right.primitive_type(), Some(EdmPrimitiveType::Decimal));
}

#[test]
fn test_constants_take_promoted_type() {
    let expr = parse_filter("Order", "Freight gt 1").unwrap();
    let Expression::Relational { right, .. } = expr else {
        panic!("expected relational");
    };
    match *right {
        Expression::Constant(constant) => {
            assert_eq!(constant.ty, EdmPrimitiveType::Double);
            assert_eq!(constant.value, Value::Double(1.0));
        }
        other => panic!("expected constant, got {:?}", other),
    }
}

#[test]
fn test_small_integral_properties_promote_to_int32() {
    let expr = parse_expression("Order_Detail", "Quantity mul 2").unwrap();
    assert_eq!(expr.primitive_type(), Some(EdmPrimitiveType::Int32));

    let expr = parse_expression("Order_Detail", "Quantity mul Discount").unwrap();
    assert_eq!(expr.primitive_type(), Some(EdmPrimitiveType::Single));
}

#[test]
fn test_unary_minus() {
    let expr = parse_expression("Customer", "-Rating").unwrap();
    assert!(matches!(
        expr,
        Expression::Unary {
            op: UnaryOp::Negate,
            ty: EdmPrimitiveType::Int32,
            ..
        }
    ));

    let expr = parse_expression("Customer", "-(1)").unwrap();
    match expr {
        Expression::Constant(constant) => {
            assert_eq!(constant.value, Value::Int32(-1));
            assert_eq!(constant.text, "-1");
        }
        other => panic!("expected folded constant, got {:?}", other),
    }

    let err = parse_filter("Customer", "-CompanyName eq 'a'").unwrap_err();
    assert_eq!(
        err.message(),
        "Operator '-' incompatible with operand type Edm.String at position 0"
    );
}

#[test]
fn test_integer_overflow_is_rejected() {
    let err = parse_filter("Customer", "Rating eq 3000000000").unwrap_err();
    assert!(matches!(err, Error::Syntax { .. }));
    assert!(err.message().starts_with("Unrecognized 'Edm.Int32' literal"));
}

// ============================================================================
// Null handling
// ============================================================================

#[test]
fn test_eq_null_becomes_is_null() {
    let expr = parse_filter("Customer", "Country eq null").unwrap();
    assert_eq!(function_id(&expr), Some(FunctionId::IsNull));

    let expr = parse_filter("Customer", "null eq Country").unwrap();
    assert_eq!(function_id(&expr), Some(FunctionId::IsNull));

    let expr = parse_filter("Customer", "Country ne null").unwrap();
    match expr {
        Expression::Unary {
            op: UnaryOp::Not,
            child,
            ..
        } => assert_eq!(function_id(&child), Some(FunctionId::IsNull)),
        other => panic!("expected negated isNull, got {:?}", other),
    }
}

#[test]
fn test_null_only_with_equality() {
    let err = parse_filter("Customer", "Rating lt null").unwrap_err();
    assert!(err
        .message()
        .starts_with("The operator 'lt' at position 7 is not supported for the 'null' literal"));

    let err = parse_filter("Customer", "Rating add null eq 1").unwrap_err();
    assert!(err.message().starts_with("The operator 'add'"));

    let err = parse_filter("Customer", "null eq null").unwrap_err();
    assert!(err.message().starts_with("The operator 'eq'"));

    let err = parse_filter("Customer", "null").unwrap_err();
    assert_eq!(
        err.message(),
        "Expression of type 'Edm.Boolean' expected at position 0"
    );
}

#[test]
fn test_null_function_argument() {
    let err = parse_filter("Customer", "length(null) eq 1").unwrap_err();
    assert!(err.message().contains("cannot be used as an argument of 'length'"));
}

// ============================================================================
// Relational lowering
// ============================================================================

#[test]
fn test_string_comparison_lowers_to_compare() {
    let expr = parse_filter("Customer", "CompanyName gt 'A'").unwrap();
    let Expression::Relational { op, left, right } = expr else {
        panic!("expected relational");
    };
    assert_eq!(op, RelationalOp::Gt);
    assert_eq!(function_id(&left), Some(FunctionId::Compare));
    assert!(matches!(*right, Expression::Constant(ref c) if c.value == Value::Int32(0)));
}

#[test]
fn test_datetime_comparison_lowers_to_compare() {
    let expr = parse_filter("Customer", "Since lt datetime'2000-01-01T00:00:00'").unwrap();
    let Expression::Relational { left, .. } = expr else {
        panic!("expected relational");
    };
    match *left {
        Expression::FunctionCall { function, .. } => {
            assert_eq!(function.id, FunctionId::Compare);
            assert_eq!(function.params[0], EdmPrimitiveType::DateTime);
        }
        other => panic!("expected compare, got {:?}", other),
    }
}

#[test]
fn test_guid_and_binary_equality() {
    let expr = parse_filter(
        "Product",
        "ProductGuid eq guid'05b242e7-52eb-46bd-8f0e-6568b72cd9a5'",
    )
    .unwrap();
    assert_eq!(function_id(&expr), Some(FunctionId::GuidEqual));

    let expr = parse_filter("Product", "Signature ne X'AB01'").unwrap();
    assert!(matches!(expr, Expression::Unary { op: UnaryOp::Not, .. }));

    let err = parse_filter("Product", "Signature gt X'AB01'").unwrap_err();
    assert_eq!(
        err.message(),
        "Operator 'gt' incompatible with operand types Edm.Binary and Edm.Binary"
    );
}

#[test]
fn test_boolean_supports_equality_only() {
    assert!(parse_filter("Customer", "Active eq true").is_ok());
    assert!(parse_filter("Customer", "Active gt false").is_err());
}

#[test]
fn test_mismatched_operands() {
    let err = parse_filter("Customer", "CompanyName eq 1").unwrap_err();
    assert_eq!(
        err.message(),
        "Operator 'eq' incompatible with operand types Edm.String and Edm.Int32"
    );
}

// ============================================================================
// Logical operators and precedence
// ============================================================================

#[test]
fn test_precedence() {
    let expr = parse_filter("Customer", "Active or Rating gt 1 and Rating lt 5").unwrap();
    let Expression::Logical { op, right, .. } = expr else {
        panic!("expected logical");
    };
    assert_eq!(op, LogicalOp::Or);
    assert!(matches!(
        *right,
        Expression::Logical {
            op: LogicalOp::And,
            ..
        }
    ));

    let expr = parse_expression("Customer", "1 add 2 mul 3").unwrap();
    let Expression::Arithmetic { op, right, .. } = expr else {
        panic!("expected arithmetic");
    };
    assert_eq!(op, ArithmeticOp::Add);
    assert!(matches!(
        *right,
        Expression::Arithmetic {
            op: ArithmeticOp::Mul,
            ..
        }
    ));
}

#[test]
fn test_logical_operands_must_be_boolean() {
    let err = parse_filter("Customer", "Rating and Active").unwrap_err();
    assert_eq!(
        err.message(),
        "Operator 'and' incompatible with operand types Edm.Int32 and Edm.Boolean"
    );

    let err = parse_filter("Customer", "not Rating").unwrap_err();
    assert_eq!(
        err.message(),
        "Operator 'not' incompatible with operand type Edm.Int32 at position 0"
    );

    assert!(parse_filter("Customer", "not not Active").is_ok());
    assert!(parse_filter("Customer", "not (Rating eq 1)").is_ok());
}

#[test]
fn test_filter_must_be_boolean() {
    let err = parse_filter("Customer", "Rating add 1").unwrap_err();
    assert!(matches!(err, Error::Type { .. }));
    assert_eq!(
        err.message(),
        "Expression of type 'Edm.Boolean' expected at position 0"
    );
}

// ============================================================================
// Syntax errors
// ============================================================================

#[test]
fn test_syntax_errors() {
    let err = parse_filter("Customer", "(Rating eq 1").unwrap_err();
    assert_eq!(err.message(), "')' or operator expected at position 12");

    let err = parse_filter("Customer", "Rating eq 1 2").unwrap_err();
    assert_eq!(err.message(), "Syntax error at position 12");

    let err = parse_filter("Customer", "Rating = 1").unwrap_err();
    assert_eq!(err.message(), "Syntax error at position 7");

    let err = parse_filter("Customer", "Rating eq").unwrap_err();
    assert_eq!(err.message(), "Expression expected at position 9");

    let err = parse_filter("Customer", "").unwrap_err();
    assert_eq!(err.message(), "Expression expected at position 0");
}

#[test]
fn test_error_positions() {
    let cases = vec![
        ("(Rating eq 1", Some(12)),
        ("Rating eq 1 2", Some(12)),
        ("Rating eq", Some(9)),
        ("Rating lt null", Some(7)),
        ("Active and not Rating", Some(11)),
        ("Active and -CompanyName eq 'a'", Some(11)),
        ("startswith(CompanyName, null)", Some(24)),
        ("Active or length(Rating) eq 1", Some(10)),
        ("Rating", Some(0)),
        ("Rating eq CompanyName", None),
    ];

    for (expr, position) in cases {
        let err = parse_filter("Customer", expr).unwrap_err();
        assert!(
            matches!(err, Error::Syntax { .. } | Error::Type { .. }),
            "{}: {:?}",
            expr,
            err
        );
        assert_eq!(err.position(), position, "{}", expr);
    }
}

#[test]
fn test_recursion_limit() {
    let text = format!("{}Active", "not ".repeat(300));
    let err = parse_filter("Customer", &text).unwrap_err();
    assert_eq!(err.message(), "Expression too deeply nested (max depth: 200)");

    let options = ParserOptions { max_depth: 500 };
    let mut parser = ExpressionParser::with_options(
        &text,
        resource_type("Customer"),
        metadata(),
        true,
        options,
    )
    .unwrap();
    assert!(parser.parse_filter().is_ok());
}

// ============================================================================
// Property paths
// ============================================================================

#[test]
fn test_unknown_property() {
    let err = parse_filter("Customer", "Foo eq 1").unwrap_err();
    assert!(matches!(err, Error::Resolution(_)));
    assert_eq!(
        err.message(),
        "No property 'Foo' exists in type 'Customer' at position 0"
    );
}

#[test]
fn test_collection_navigation_is_rejected() {
    let err = parse_filter("Customer", "Orders/OrderID eq 1").unwrap_err();
    assert!(err
        .message()
        .contains("is an entity collection property of 'Customer'"));
    assert!(err.message().contains("$filter"));

    let mut parser = ExpressionParser::new(
        "Orders/OrderID",
        resource_type("Customer"),
        metadata(),
        false,
    )
    .unwrap();
    let err = parser.parse_orderby().unwrap_err();
    assert!(err.message().contains("$orderby"));
}

#[test]
fn test_bag_property_is_rejected() {
    let err = parse_filter("Employee", "Emails eq 'a'").unwrap_err();
    assert_eq!(
        err.message(),
        "The 'Emails' is a bag property of 'Employee' (position: 0), which cannot be used in $filter query option"
    );
}

#[test]
fn test_complex_path_resolves_leaf_type() {
    let expr = parse_expression("Customer", "Address/LineNumber").unwrap();
    assert_eq!(expr.primitive_type(), Some(EdmPrimitiveType::Int32));

    let Expression::PropertyAccess(access) = expr else {
        panic!("expected property access");
    };
    assert_eq!(access.path(), vec!["Address", "LineNumber"]);
    assert!(access.has_parent());
}

#[test]
fn test_navigation_paths_recorded() {
    let mut parser = filter_parser(
        "Order",
        "Customer/Address/LineNumber add 4 eq 8 and Customer/CompanyName eq 'x' and OrderID gt 1",
    )
    .unwrap();
    parser.parse_filter().unwrap();

    let paths: Vec<Vec<String>> = parser
        .navigation_properties_used()
        .iter()
        .map(|path| path.iter().map(|p| p.name.to_string()).collect())
        .collect();
    assert_eq!(
        paths,
        vec![
            vec!["Customer".to_string(), "Address".to_string()],
            vec!["Customer".to_string()],
        ]
    );
}

#[test]
fn test_path_into_primitive_fails() {
    let err = parse_filter("Customer", "Rating/Foo eq 1").unwrap_err();
    assert_eq!(err.message(), "Syntax error at position 6");
}

// ============================================================================
// Functions
// ============================================================================

#[test]
fn test_function_resolution() {
    let expr = parse_filter("Customer", "substring(CompanyName, 1) eq 'a'").unwrap();
    let Expression::Relational { left, .. } = expr else {
        panic!("expected relational");
    };
    match *left {
        Expression::FunctionCall { args, .. } => {
            assert_eq!(args.len(), 2);
            assert_eq!(function_id(&args[0]), Some(FunctionId::Substring));
        }
        other => panic!("expected compare call, got {:?}", other),
    }

    assert!(parse_filter("Customer", "substringof('Al', CompanyName)").is_ok());
    assert!(parse_filter("Order", "year(OrderDate) eq 1996").is_ok());
    assert!(parse_filter("Order", "round(Freight) gt 1").is_ok());
    assert!(parse_filter("Order", "round(Price) gt 1").is_ok());
}

#[test]
fn test_function_overload_by_argument_type() {
    let expr = parse_expression("Order", "floor(Price)").unwrap();
    assert_eq!(expr.primitive_type(), Some(EdmPrimitiveType::Decimal));

    let expr = parse_expression("Product", "floor(Weight)").unwrap();
    assert_eq!(expr.primitive_type(), Some(EdmPrimitiveType::Double));
}

#[test]
fn test_no_applicable_function() {
    let err = parse_filter("Customer", "substring(CompanyName) eq 'a'").unwrap_err();
    assert!(matches!(err, Error::Type { .. }));
    assert_eq!(
        err.message(),
        "No applicable function found for 'substring' at position 0 with the specified arguments. The functions considered are: substring(Edm.String, Edm.Int32); substring(Edm.String, Edm.Int32, Edm.Int32)"
    );
}

#[test]
fn test_unknown_function() {
    let err = parse_filter("Customer", "foo(1) eq 1").unwrap_err();
    assert!(matches!(err, Error::Resolution(_)));
    assert_eq!(err.message(), "Unknown function 'foo' at position 0");

    // Internal functions are not callable by name
    let err = parse_filter("Customer", "isNull(Country)").unwrap_err();
    assert_eq!(err.message(), "Unknown function 'isNull' at position 0");
}

// ============================================================================
// $orderby
// ============================================================================

#[test]
fn test_orderby() {
    let mut parser = ExpressionParser::new(
        "Rating desc, CompanyName, Address/Country asc",
        resource_type("Customer"),
        metadata(),
        false,
    )
    .unwrap();
    let items = parser.parse_orderby().unwrap();
    assert_eq!(items.len(), 3);
    assert!(!items[0].ascending);
    assert!(items[1].ascending);
    assert!(items[2].ascending);
}

#[test]
fn test_orderby_requires_primitive() {
    let mut parser =
        ExpressionParser::new("Address", resource_type("Customer"), metadata(), false).unwrap();
    let err = parser.parse_orderby().unwrap_err();
    assert_eq!(
        err.message(),
        "Expression of primitive type expected at position 0"
    );
}

// ============================================================================
// Idempotence
// ============================================================================

#[test]
fn test_reparse_is_idempotent() {
    let text = "Customer/Address/LineNumber add 4 eq 8 or ShipName eq 'x'";
    let mut parser = filter_parser("Order", text).unwrap();
    let first = parser.parse_filter().unwrap();
    let second = parser.parse_filter().unwrap();
    assert_eq!(first, second);
    assert_eq!(parser.navigation_properties_used().len(), 1);

    parser.reset_parser("OrderID eq 1").unwrap();
    let other = parser.parse_filter().unwrap();
    assert_ne!(first, other);
    assert!(parser.navigation_properties_used().is_empty());

    parser.reset_parser(text).unwrap();
    assert_eq!(parser.parse_filter().unwrap(), first);
}
