//! # FHIR Type Hierarchy
//!
//! Implements type specifiers and the supertype table behind the `is`/`as`
//! operators and the `ofType()` function.
//!
//! Every specifier belongs to one of two namespaces. System types all derive
//! from `System.Any`. FHIR types follow a fixed parent table: constrained
//! primitives point at their base primitive, quantity profiles at
//! `Quantity`, backbone datatypes at `BackboneElement`, and any other known
//! datatype at `Element`. A name the table does not know is taken to be a
//! resource and derives from `DomainResource`.

use std::collections::HashMap;
use std::fmt;

use atrius_fhirpath_support::system::Any;
use atrius_fhirpath_support::{EvaluationError, Item};
use once_cell::sync::Lazy;

/// Namespace of a type specifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    System,
    Fhir,
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Namespace::System => f.write_str("System"),
            Namespace::Fhir => f.write_str("FHIR"),
        }
    }
}

/// The FHIR types with a known place in the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FhirType {
    // Primitives
    Boolean,
    String,
    Integer,
    Decimal,
    Date,
    DateTime,
    Time,
    Instant,
    Uri,
    Url,
    Canonical,
    Uuid,
    Oid,
    Code,
    Markdown,
    Id,
    Base64Binary,
    UnsignedInt,
    PositiveInt,
    Integer64,
    Xhtml,
    // General purpose datatypes
    Element,
    BackboneElement,
    Extension,
    Quantity,
    Duration,
    MoneyQuantity,
    Age,
    Count,
    Distance,
    SimpleQuantity,
    Coding,
    CodeableConcept,
    CodeableReference,
    Reference,
    Identifier,
    HumanName,
    Address,
    ContactPoint,
    ContactDetail,
    Period,
    Range,
    Ratio,
    RatioRange,
    Attachment,
    Annotation,
    Meta,
    Narrative,
    Money,
    SampledData,
    Signature,
    Expression,
    UsageContext,
    RelatedArtifact,
    TriggerDefinition,
    DataRequirement,
    ParameterDefinition,
    Timing,
    Dosage,
    ElementDefinition,
    // Resource roots
    Resource,
    DomainResource,
    Bundle,
    Binary,
    Parameters,
}

static FHIR_TYPES: Lazy<HashMap<&'static str, FhirType>> =
    Lazy::new(|| FhirType::ALL.iter().map(|ty| (ty.name(), *ty)).collect());

impl FhirType {
    /// Every variant, in declaration order.
    pub const ALL: &'static [FhirType] = {
        use FhirType::*;
        &[
            Boolean, String, Integer, Decimal, Date, DateTime, Time, Instant, Uri,
            Url, Canonical, Uuid, Oid, Code, Markdown, Id, Base64Binary,
            UnsignedInt, PositiveInt, Integer64, Xhtml, Element, BackboneElement,
            Extension, Quantity, Duration, MoneyQuantity, Age, Count, Distance,
            SimpleQuantity, Coding, CodeableConcept, CodeableReference, Reference,
            Identifier, HumanName, Address, ContactPoint, ContactDetail, Period,
            Range, Ratio, RatioRange, Attachment, Annotation, Meta, Narrative,
            Money, SampledData, Signature, Expression, UsageContext,
            RelatedArtifact, TriggerDefinition, DataRequirement,
            ParameterDefinition, Timing, Dosage, ElementDefinition, Resource,
            DomainResource, Bundle, Binary, Parameters,
        ]
    };

    pub fn from_name(name: &str) -> Option<FhirType> {
        FHIR_TYPES.get(name).copied()
    }

    pub fn name(self) -> &'static str {
        use FhirType::*;
        match self {
            Boolean => "boolean",
            String => "string",
            Integer => "integer",
            Decimal => "decimal",
            Date => "date",
            DateTime => "dateTime",
            Time => "time",
            Instant => "instant",
            Uri => "uri",
            Url => "url",
            Canonical => "canonical",
            Uuid => "uuid",
            Oid => "oid",
            Code => "code",
            Markdown => "markdown",
            Id => "id",
            Base64Binary => "base64Binary",
            UnsignedInt => "unsignedInt",
            PositiveInt => "positiveInt",
            Integer64 => "integer64",
            Xhtml => "xhtml",
            Element => "Element",
            BackboneElement => "BackboneElement",
            Extension => "Extension",
            Quantity => "Quantity",
            Duration => "Duration",
            MoneyQuantity => "MoneyQuantity",
            Age => "Age",
            Count => "Count",
            Distance => "Distance",
            SimpleQuantity => "SimpleQuantity",
            Coding => "Coding",
            CodeableConcept => "CodeableConcept",
            CodeableReference => "CodeableReference",
            Reference => "Reference",
            Identifier => "Identifier",
            HumanName => "HumanName",
            Address => "Address",
            ContactPoint => "ContactPoint",
            ContactDetail => "ContactDetail",
            Period => "Period",
            Range => "Range",
            Ratio => "Ratio",
            RatioRange => "RatioRange",
            Attachment => "Attachment",
            Annotation => "Annotation",
            Meta => "Meta",
            Narrative => "Narrative",
            Money => "Money",
            SampledData => "SampledData",
            Signature => "Signature",
            Expression => "Expression",
            UsageContext => "UsageContext",
            RelatedArtifact => "RelatedArtifact",
            TriggerDefinition => "TriggerDefinition",
            DataRequirement => "DataRequirement",
            ParameterDefinition => "ParameterDefinition",
            Timing => "Timing",
            Dosage => "Dosage",
            ElementDefinition => "ElementDefinition",
            Resource => "Resource",
            DomainResource => "DomainResource",
            Bundle => "Bundle",
            Binary => "Binary",
            Parameters => "Parameters",
        }
    }

    /// The direct supertype. `Element` and `Resource` are their own parent.
    pub fn parent(self) -> FhirType {
        use FhirType::*;
        match self {
            Code | Markdown | Id => String,
            UnsignedInt | PositiveInt => Integer,
            Url | Canonical | Uuid | Oid => Uri,
            Duration | MoneyQuantity | Age | Count | Distance | SimpleQuantity => Quantity,
            Timing | Dosage | ElementDefinition => BackboneElement,
            Bundle | Binary | Parameters | DomainResource => Resource,
            Element => Element,
            Resource => Resource,
            _ => Element,
        }
    }
}

/// System type names, which unqualified specifiers resolve to first.
const SYSTEM_TYPES: &[&str] = &[
    "Any", "Boolean", "String", "Integer", "Decimal", "Date", "DateTime", "Time", "Quantity",
];

/// A namespace-qualified type name such as `FHIR.Patient` or `System.String`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeSpecifier {
    pub namespace: Namespace,
    pub name: String,
}

impl TypeSpecifier {
    pub fn new(namespace: Namespace, name: impl Into<String>) -> Self {
        Self {
            namespace,
            name: name.into(),
        }
    }

    pub fn system(name: impl Into<String>) -> Self {
        Self::new(Namespace::System, name)
    }

    pub fn fhir(name: impl Into<String>) -> Self {
        Self::new(Namespace::Fhir, name)
    }

    /// Parses `FHIR.Patient`, `System.String` or a bare name. Bare System
    /// type names (`String`, `Quantity`, ...) resolve to the System
    /// namespace, anything else to FHIR.
    pub fn parse(specifier: &str) -> Result<Self, EvaluationError> {
        let specifier = specifier.trim().trim_matches('`');
        let (namespace, name) = match specifier.split_once('.') {
            Some(("System", name)) => (Namespace::System, name),
            Some(("FHIR", name)) => (Namespace::Fhir, name),
            Some(_) => {
                return Err(EvaluationError::InvalidType(format!(
                    "unknown type namespace in '{}'",
                    specifier
                )));
            }
            None if SYSTEM_TYPES.contains(&specifier) => (Namespace::System, specifier),
            None => (Namespace::Fhir, specifier),
        };
        let name = name.trim_matches('`');
        if name.is_empty() {
            return Err(EvaluationError::InvalidType(format!(
                "empty type name in '{}'",
                specifier
            )));
        }
        Ok(Self::new(namespace, name))
    }

    /// The direct supertype; roots return themselves.
    pub fn parent(&self) -> TypeSpecifier {
        match self.namespace {
            Namespace::System => TypeSpecifier::system("Any"),
            Namespace::Fhir => {
                let parent = FhirType::from_name(&self.name)
                    .map(FhirType::parent)
                    .unwrap_or(FhirType::DomainResource);
                TypeSpecifier::fhir(parent.name())
            }
        }
    }

    /// True when `self` is `other` or one of its subtypes.
    pub fn is(&self, other: &TypeSpecifier) -> bool {
        if self.namespace != other.namespace {
            return false;
        }
        let mut current = self.clone();
        loop {
            if current.name == other.name {
                return true;
            }
            let parent = current.parent();
            if parent == current {
                return false;
            }
            current = parent;
        }
    }
}

impl fmt::Display for TypeSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}

/// The type of a collection item: `System.<Type>` for System values, the
/// declared FHIR type for nodes (after unwrapping a choice), `FHIR.code` for
/// coded enums. `None` for nodes without a declared type.
pub fn type_of(item: &Item) -> Option<TypeSpecifier> {
    match item {
        Item::System(value) => Some(system_type_of(value)),
        Item::Node(node) => {
            if let Some(inner) = node.unwrap_choice() {
                return type_of(&inner);
            }
            if node.is_code() {
                return Some(TypeSpecifier::fhir("code"));
            }
            node.type_name().map(TypeSpecifier::fhir)
        }
    }
}

fn system_type_of(value: &Any) -> TypeSpecifier {
    TypeSpecifier::system(value.type_name())
}
