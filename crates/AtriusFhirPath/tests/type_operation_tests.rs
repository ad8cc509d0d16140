mod common;

use atrius_fhir_path::fhir_type_hierarchy::{TypeSpecifier, type_of};
use atrius_fhir_path::{Collection, EvaluationError, Expression, Item, evaluate};
use common::*;

fn is(expression: Expression, specifier: &str) -> Expression {
    Expression::is_type(expression, TypeSpecifier::parse(specifier).unwrap())
}

fn as_type(expression: Expression, specifier: &str) -> Expression {
    Expression::as_type(expression, TypeSpecifier::parse(specifier).unwrap())
}

/// `FHIR.string` in argument position.
fn qualified(namespace: &str, name: &str) -> Expression {
    Expression::sequence(vec![Expression::type_name(namespace), Expression::type_name(name)])
}

#[test]
fn test_is_with_system_types() {
    let cases = [
        ("true", "Boolean", true),
        ("1", "Integer", true),
        ("1", "System.Integer", true),
        ("1", "Decimal", false),
        ("1.0", "Decimal", true),
        ("'a'", "String", true),
        ("@2012", "Date", true),
        ("@2012-01-01T10:00", "DateTime", true),
        ("@T10:00", "Time", true),
        ("5 'mg'", "Quantity", true),
        ("5 'mg'", "System.Any", true),
        ("'a'", "FHIR.string", false),
    ];
    for (literal, specifier, expected) in cases {
        assert_eq!(
            eval_empty(&is(lit(literal), specifier)).unwrap(),
            boolean(expected),
            "{} is {}",
            literal,
            specifier
        );
    }
}

#[test]
fn test_is_with_fhir_resources() {
    let input = patient();
    assert_eq!(eval_ok(&is(Expression::Identity, "FHIR.Patient"), &input), boolean(true));
    assert_eq!(eval_ok(&is(Expression::Identity, "Patient"), &input), boolean(true));
    assert_eq!(eval_ok(&is(Expression::Identity, "FHIR.DomainResource"), &input), boolean(true));
    assert_eq!(eval_ok(&is(Expression::Identity, "FHIR.Resource"), &input), boolean(true));
    assert_eq!(eval_ok(&is(Expression::Identity, "FHIR.Observation"), &input), boolean(false));

    let gender = path(&["gender"]);
    assert_eq!(eval_ok(&is(gender.clone(), "FHIR.string"), &input), boolean(true));
    assert_eq!(eval_ok(&is(gender.clone(), "FHIR.Element"), &input), boolean(true));
    assert_eq!(eval_ok(&is(gender, "System.String"), &input), boolean(false));
}

#[test]
fn test_constrained_primitive_hierarchy() {
    let markdown = TestNode::primitive("markdown", value("'**bold**'")).collection();
    for (specifier, expected) in [
        ("FHIR.markdown", true),
        ("FHIR.string", true),
        ("FHIR.Element", true),
        ("FHIR.integer", false),
    ] {
        assert_eq!(
            eval_ok(&is(Expression::Identity, specifier), &markdown),
            boolean(expected),
            "markdown is {}",
            specifier
        );
    }

    assert!(TypeSpecifier::fhir("markdown").is(&TypeSpecifier::fhir("string")));
    assert!(TypeSpecifier::fhir("markdown").is(&TypeSpecifier::fhir("Element")));
    assert!(TypeSpecifier::fhir("unsignedInt").is(&TypeSpecifier::fhir("integer")));
    assert!(!TypeSpecifier::fhir("string").is(&TypeSpecifier::fhir("markdown")));
    assert!(!TypeSpecifier::system("String").is(&TypeSpecifier::fhir("string")));
}

#[test]
fn test_coded_values_are_codes() {
    let gender = TestNode::code("AdministrativeGender", "male").item();
    assert_eq!(type_of(&gender), Some(TypeSpecifier::fhir("code")));

    let input = Collection::from(vec![gender]);
    assert_eq!(eval_ok(&is(Expression::Identity, "FHIR.code"), &input), boolean(true));
    assert_eq!(eval_ok(&is(Expression::Identity, "FHIR.string"), &input), boolean(true));
}

#[test]
fn test_is_cardinality() {
    let input = patient();
    assert!(eval_ok(&is(path(&["photo"]), "FHIR.Attachment"), &input).is_empty());
    assert!(matches!(
        eval(&is(path(&["name"]), "FHIR.HumanName"), &input),
        Err(EvaluationError::NotSingleton(_))
    ));
}

#[test]
fn test_as() {
    let input = observation();
    let quantity = Expression::sequence(vec![
        as_type(path(&["value"]), "FHIR.Quantity"),
        Expression::field("value"),
    ]);
    assert_eq!(eval_values(&quantity, &input), singleton("185"));
    assert!(eval_ok(&as_type(path(&["value"]), "FHIR.Period"), &input).is_empty());
    assert_eq!(eval_ok(&as_type(lit("1"), "Integer"), &Collection::new()), singleton("1"));
    assert!(eval_ok(&as_type(lit("1"), "String"), &Collection::new()).is_empty());
}

#[test]
fn test_as_unwraps_choice() {
    let wrapped = TestNode::choice(Item::from(5)).collection();
    assert_eq!(type_of(&wrapped.items()[0]), Some(TypeSpecifier::system("Integer")));

    let input = Collection::new();
    let mut context = context_for(&input).with_constant("value", wrapped);
    let expression = as_type(Expression::constant("value"), "Integer");
    assert_eq!(
        evaluate(&mut context, &expression, &input).unwrap(),
        Collection::singleton(5)
    );
}

#[test]
fn test_of_type() {
    let mixed = list(&["1", "'a'", "2.5", "3", "@2012"]);
    let integers = call("ofType", vec![Expression::type_name("Integer")]);
    assert_eq!(eval_ok(&integers, &mixed), list(&["1", "3"]));

    let any = call("ofType", vec![qualified("System", "Any")]);
    assert_eq!(eval_ok(&any, &mixed), mixed);

    let strings_only = Expression::sequence(vec![
        Expression::field("telecom"),
        Expression::field("system"),
        call("ofType", vec![qualified("FHIR", "string")]),
    ]);
    assert_eq!(eval_values(&strings_only, &patient()), strings(&["phone", "email"]));
}

#[test]
fn test_function_forms() {
    let is_fn = invoke(lit("1"), "is", vec![Expression::type_name("Integer")]);
    assert_eq!(eval_empty(&is_fn).unwrap(), boolean(true));

    let is_qualified = invoke(path(&["gender"]), "is", vec![qualified("FHIR", "string")]);
    assert_eq!(eval_ok(&is_qualified, &patient()), boolean(true));

    let as_fn = invoke(lit("'a'"), "as", vec![Expression::type_name("Integer")]);
    assert!(eval_empty(&as_fn).unwrap().is_empty());

    let not_a_type = invoke(lit("1"), "is", vec![lit("1")]);
    assert!(matches!(eval_empty(&not_a_type), Err(EvaluationError::InvalidType(_))));
}

#[test]
fn test_type_specifier_parsing() {
    assert_eq!(TypeSpecifier::parse("String").unwrap(), TypeSpecifier::system("String"));
    assert_eq!(TypeSpecifier::parse("Patient").unwrap(), TypeSpecifier::fhir("Patient"));
    assert_eq!(TypeSpecifier::parse("FHIR.`string`").unwrap(), TypeSpecifier::fhir("string"));
    assert!(TypeSpecifier::parse("Other.Thing").is_err());
    assert_eq!(TypeSpecifier::fhir("Patient").to_string(), "FHIR.Patient");
}
