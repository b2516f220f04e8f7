//! Output file names for saved records.

use crate::models::Demographics;

/// `LASTNAME_FIRSTNAME_PID.json`.
///
/// Names are uppercased with whitespace runs collapsed to `_`. The personal
/// ID keeps only `[A-Za-z0-9_-]`.
pub fn visit_filename(demographics: &Demographics) -> String {
    format!(
        "{}_{}_{}.json",
        name_part(&demographics.last_name),
        name_part(&demographics.first_name),
        id_part(&demographics.personal_id)
    )
}

fn name_part(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_space = false;
    for c in name.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push('_');
            }
            in_space = true;
        } else {
            out.extend(c.to_uppercase());
            in_space = false;
        }
    }
    out
}

fn id_part(personal_id: &str) -> String {
    personal_id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}
