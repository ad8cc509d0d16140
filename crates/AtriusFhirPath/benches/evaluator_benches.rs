use atrius_fhir_path::expression::{ArithmeticOp, BooleanOp};
use atrius_fhir_path::fhir_type_hierarchy::TypeSpecifier;
use atrius_fhir_path::json_node::JsonNode;
use atrius_fhir_path::{Any, Collection, EvaluationContext, Expression, FunctionTable, evaluate};
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use serde_json::json;

fn create_patient() -> Collection {
    JsonNode::collection(json!({
        "resourceType": "Patient",
        "id": "complex",
        "active": true,
        "name": [
            {"use": "official", "family": "Chalmers", "given": ["Peter", "James"]},
            {"use": "usual", "family": "Chalmers", "given": ["Jim"]},
            {"use": "maiden", "family": "Windsor", "given": ["Peter", "James"]}
        ],
        "telecom": [
            {"system": "phone", "value": "(03) 5555 6473", "use": "work"},
            {"system": "phone", "value": "(03) 4444 6473", "use": "mobile"},
            {"system": "email", "value": "peter@example.com", "use": "home"},
            {"system": "email", "value": "peter.chalmers@work.com", "use": "work"}
        ],
        "address": [{
            "use": "home",
            "line": ["534 Erewhon St"],
            "city": "PleasantVille",
            "postalCode": "3999"
        }],
        "gender": "male",
        "birthDate": "1974-12-25"
    }))
}

fn create_observation() -> Collection {
    JsonNode::collection(json!({
        "resourceType": "Observation",
        "id": "blood-pressure",
        "status": "final",
        "code": {"coding": [{"system": "http://loinc.org", "code": "85354-9"}]},
        "effectiveDateTime": "2023-01-15T10:30:00Z",
        "component": [
            {
                "code": {"coding": [{"system": "http://loinc.org", "code": "8480-6"}]},
                "valueQuantity": {"value": 140, "unit": "mm[Hg]", "code": "mm[Hg]"}
            },
            {
                "code": {"coding": [{"system": "http://loinc.org", "code": "8462-4"}]},
                "valueQuantity": {"value": 90, "unit": "mm[Hg]", "code": "mm[Hg]"}
            }
        ]
    }))
}

fn literal(text: &str) -> Expression {
    Expression::Literal(Any::parse_literal(text).ok())
}

fn path(type_name: &str, fields: &[&str]) -> Expression {
    let mut stages = vec![Expression::type_name(type_name)];
    stages.extend(fields.iter().map(|field| Expression::field(*field)));
    Expression::sequence(stages)
}

fn call(table: &FunctionTable, name: &str, args: Vec<Expression>) -> Expression {
    Expression::function(table, name, args).expect("builtin function")
}

fn bench(c: &mut Criterion, group_name: &str, input: &Collection, cases: Vec<(&str, Expression)>) {
    let mut group = c.benchmark_group(group_name);
    for (name, expression) in cases {
        group.bench_function(name, |b| {
            b.iter(|| {
                let mut context = EvaluationContext::new(input);
                evaluate(&mut context, black_box(&expression), input)
            })
        });
    }
    group.finish();
}

fn bench_navigation(c: &mut Criterion) {
    let patient = create_patient();
    bench(
        c,
        "evaluator/navigation",
        &patient,
        vec![
            ("single_field", path("Patient", &["active"])),
            ("nested_field", path("Patient", &["name", "family"])),
            (
                "indexed_access",
                Expression::sequence(vec![
                    Expression::type_name("Patient"),
                    Expression::field("name"),
                    Expression::index(literal("0")),
                    Expression::field("given"),
                    Expression::index(literal("1")),
                ]),
            ),
        ],
    );
}

fn bench_collection_operations(c: &mut Criterion) {
    let table = FunctionTable::builtin();
    let patient = create_patient();
    let telecom = path("Patient", &["telecom"]);
    let is_email = Expression::equal(Expression::field("system"), literal("'email'"));
    let is_mobile_phone = Expression::boolean(
        BooleanOp::And,
        Expression::equal(Expression::field("system"), literal("'phone'")),
        Expression::equal(Expression::field("use"), literal("'mobile'")),
    );
    bench(
        c,
        "evaluator/collections",
        &patient,
        vec![
            (
                "where_simple",
                Expression::sequence(vec![telecom.clone(), call(&table, "where", vec![is_email])]),
            ),
            (
                "where_complex",
                Expression::sequence(vec![telecom.clone(), call(&table, "where", vec![is_mobile_phone])]),
            ),
            (
                "distinct_given",
                Expression::sequence(vec![
                    path("Patient", &["name", "given"]),
                    call(&table, "distinct", vec![]),
                ]),
            ),
            (
                "descendants_count",
                Expression::sequence(vec![
                    call(&table, "descendants", vec![]),
                    call(&table, "count", vec![]),
                ]),
            ),
        ],
    );
}

fn bench_string_operations(c: &mut Criterion) {
    let table = FunctionTable::builtin();
    let patient = create_patient();
    let family = Expression::sequence(vec![
        path("Patient", &["name", "family"]),
        call(&table, "first", vec![]),
    ]);
    bench(
        c,
        "evaluator/strings",
        &patient,
        vec![
            (
                "upper",
                Expression::sequence(vec![family.clone(), call(&table, "upper", vec![])]),
            ),
            (
                "matches",
                Expression::sequence(vec![
                    family.clone(),
                    call(&table, "matches", vec![literal("'^Ch[a-z]+s$'")]),
                ]),
            ),
            (
                "join",
                Expression::sequence(vec![
                    path("Patient", &["name", "given"]),
                    call(&table, "join", vec![literal("', '")]),
                ]),
            ),
        ],
    );
}

fn bench_type_operations(c: &mut Criterion) {
    let table = FunctionTable::builtin();
    let observation = create_observation();
    let values = path("Observation", &["component", "value"]);
    bench(
        c,
        "evaluator/types",
        &observation,
        vec![
            (
                "of_type",
                Expression::sequence(vec![
                    values.clone(),
                    call(&table, "ofType", vec![Expression::type_name("Quantity")]),
                ]),
            ),
            (
                "is_operator",
                Expression::is_type(
                    path("Observation", &["effective"]),
                    TypeSpecifier::fhir("dateTime"),
                ),
            ),
        ],
    );
}

fn bench_arithmetic(c: &mut Criterion) {
    let observation = create_observation();
    let systolic = Expression::sequence(vec![
        path("Observation", &["component", "value"]),
        Expression::index(literal("0")),
    ]);
    bench(
        c,
        "evaluator/arithmetic",
        &observation,
        vec![
            (
                "integer_chain",
                Expression::arithmetic(
                    ArithmeticOp::Mul,
                    Expression::arithmetic(ArithmeticOp::Add, literal("1"), literal("2")),
                    literal("3"),
                ),
            ),
            (
                "quantity_add",
                Expression::arithmetic(ArithmeticOp::Add, systolic, literal("10 'mm[Hg]'")),
            ),
            (
                "date_add",
                Expression::arithmetic(ArithmeticOp::Add, literal("@2021-01-31"), literal("1 month")),
            ),
        ],
    );
}

criterion_group!(
    benches,
    bench_navigation,
    bench_collection_operations,
    bench_string_operations,
    bench_type_operations,
    bench_arithmetic,
);
criterion_main!(benches);
