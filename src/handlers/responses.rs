use crate::lookup::{CredentialKind, LookupError, TermInfo, TrendInfo};

/// Appended to image-bearing replies when the photo key is missing.
pub fn missing_image_key_note() -> String {
    format!(
        "({} API key is not set; showing default images instead.)",
        CredentialKind::Image
    )
}

const GRID_COLUMNS: usize = 3;

pub fn render_trend(term: &str, info: &TrendInfo, image_url: &str) -> String {
    let lines = vec![
        format!("### About '{}'", term.trim()),
        String::new(),
        info.description.clone(),
        String::new(),
        "---".to_string(),
        "Related image:".to_string(),
        format!("  {image_url}"),
        String::new(),
    ];
    lines.join("\n")
}

fn bullet_list(items: &[String]) -> Vec<String> {
    if items.is_empty() {
        return vec!["  (none)".to_string()];
    }
    items.iter().map(|item| format!("  - {item}")).collect()
}

pub fn render_term(name: &str, info: &TermInfo, image_url: &str) -> String {
    let mut lines = vec![format!("## {}", name.trim()), info.definition.clone()];

    lines.push(String::new());
    lines.push("Signature products / styles:".to_string());
    lines.extend(bullet_list(&info.examples));

    lines.push(String::new());
    lines.push("Brands:".to_string());
    lines.extend(bullet_list(&info.brands));

    lines.push(String::new());
    lines.push("Related terms:".to_string());
    if info.related_terms.is_empty() {
        lines.push("  (none)".to_string());
    } else {
        let tags: Vec<String> = info
            .related_terms
            .iter()
            .map(|term| format!("#{term}"))
            .collect();
        lines.push(format!("  {}", tags.join("  ")));
    }

    lines.push(String::new());
    lines.push(format!("Image: {image_url}"));
    lines.push(String::new());
    lines.join("\n")
}

/// Lays the URLs out in rows of three, numbered left to right.
pub fn render_style_grid(query: &str, urls: &[String]) -> String {
    let mut lines = vec![format!("### Styling images for '{}'", query.trim())];
    for (row_index, row) in urls.chunks(GRID_COLUMNS).enumerate() {
        lines.push(String::new());
        for (column, url) in row.iter().enumerate() {
            let number = row_index * GRID_COLUMNS + column + 1;
            lines.push(format!("  [{number}] {url}"));
        }
    }
    lines.push(String::new());
    lines.push("Images provided by Unsplash".to_string());
    lines.push(String::new());
    lines.join("\n")
}

pub fn render_error(action: &str, err: &LookupError) -> String {
    let hint = match err {
        LookupError::MissingCredential(_) => "",
        LookupError::EmptyResponse { .. } => " Try a different search term.",
        LookupError::MalformedResponse(_) | LookupError::IncompleteResponse { .. } => {
            " Please try again."
        }
        LookupError::ProviderError { .. } | LookupError::NoResults(_) => {
            " Please try again in a moment."
        }
    };
    format!("Error while {action}: {err}.{hint}\n")
}
