// Mutation engine for pvreplace
// Combines payloads with the sites found by the locator

use crate::locator::locate;
use crate::models::{CombineMode, MutationPolicy, OccurrenceMode, PartKind, Site};

/// Generate every mutated URL for one `(url, payload, policy)` triple.
///
/// Pure and total: any string is accepted and the result may be empty.
/// - `Multiple` yields one URL with every site mutated. When nothing matched,
///   parameter parts and `ExtFilename` yield the URL unchanged, other parts
///   yield nothing.
/// - `Single` yields one URL per site, in left-to-right order.
pub fn mutate(url: &str, payload: &str, policy: &MutationPolicy) -> Vec<String> {
    let sites = locate(url, policy.part);
    combine(url, &sites, payload, policy)
}

/// Apply `payload` to `sites` of `url` under `policy`.
pub fn combine(url: &str, sites: &[Site], payload: &str, policy: &MutationPolicy) -> Vec<String> {
    match policy.occurrence {
        OccurrenceMode::Multiple => {
            if sites.is_empty() && !policy.part.passes_through_unmatched() {
                return Vec::new();
            }
            vec![splice(url, sites, |original| {
                render(policy.part, policy.combine, original, payload)
            })]
        }
        OccurrenceMode::Single => sites
            .iter()
            .map(|site| {
                splice(url, std::slice::from_ref(site), |original| {
                    render(policy.part, policy.combine, original, payload)
                })
            })
            .collect(),
    }
}

/// Rebuild `url` with every site swapped for its rendering.
///
/// Sites must be sorted and non-overlapping, which the locator guarantees.
pub fn splice<F>(url: &str, sites: &[Site], mut render_site: F) -> String
where
    F: FnMut(&str) -> String,
{
    let mut out = String::with_capacity(url.len() + sites.len() * 16);
    let mut cursor = 0;
    for site in sites {
        out.push_str(&url[cursor..site.span.start]);
        out.push_str(&render_site(site.content(url)));
        cursor = site.span.end;
    }
    out.push_str(&url[cursor..]);
    out
}

/// Render the new content of one site.
fn render(part: PartKind, combine: CombineMode, original: &str, payload: &str) -> String {
    match part {
        // The site includes '=', which always survives
        PartKind::ParamValue => {
            let value = original.strip_prefix('=').unwrap_or(original);
            match combine {
                CombineMode::Replace => format!("={}", payload),
                CombineMode::Prefix => format!("={}{}", payload, value),
                CombineMode::Postfix => format!("={}{}", value, payload),
            }
        }
        // Inserts only: the filename stem is never discarded
        PartKind::PathSuffix => match combine {
            CombineMode::Prefix => format!("{}{}", payload, original),
            CombineMode::Replace | CombineMode::Postfix => format!("{}{}", original, payload),
        },
        PartKind::PathSuffixSlash => format!("{}/{}", original, payload),
        PartKind::ParamName | PartKind::PathSegment | PartKind::ExtFilename => match combine {
            CombineMode::Replace => payload.to_string(),
            CombineMode::Prefix => format!("{}{}", payload, original),
            CombineMode::Postfix => format!("{}{}", original, payload),
        },
    }
}
