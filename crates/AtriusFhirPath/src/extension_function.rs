//! # FHIRPath Extension Function
//!
//! Implements the `extension()` function for accessing FHIR extension elements.

use atrius_fhirpath_support::system::Any;
use atrius_fhirpath_support::{Collection, EvaluationError, Item};

/// The `url` of an extension node, if it has a single String one.
fn extension_url(extension: &Item) -> Option<String> {
    let urls = extension.as_node()?.field("url")?;
    match urls.as_slice() {
        [url] => match url.to_system() {
            Some(Any::String(url)) => Some(url),
            _ => None,
        },
        _ => None,
    }
}

/// Implementation of the FHIRPath extension(url) function
///
/// Returns the extensions of the input nodes whose `url` equals `url`.
/// Equivalent to `extension.where(url = %url)`, except that items without an
/// `extension` field (including System values) are skipped instead of
/// failing navigation.
///
/// Primitive elements expose the extensions held by their `_name` sibling
/// through the same `extension` field, so `Patient.birthDate.extension(url)`
/// works on JSON resources.
pub fn extension_function(input: &Collection, url: String) -> Result<Collection, EvaluationError> {
    let mut output = Collection::new();
    for node in input.iter().filter_map(Item::as_node) {
        let Some(extensions) = node.field("extension") else {
            continue;
        };
        for extension in extensions {
            if extension_url(&extension).as_deref() == Some(url.as_str()) {
                output.push(extension);
            }
        }
    }
    Ok(output)
}
