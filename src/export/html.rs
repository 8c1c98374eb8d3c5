//! Self-contained HTML export: a navigable report with a table of
//! contents, profile blockquote, a mermaid mind-map of key individuals,
//! and per-node sections for every selected node. Sealed with the same
//! self-referential hash technique as the JSON export.

use super::hash::seal_document;
use crate::model::{AnalysisNode, Veracity};
use crate::summary::Category;
use crate::tree;

/// Fixed download filename for the HTML export.
pub const HTML_EXPORT_FILENAME: &str = "analysis-export.html";

const HTML_HASH_PLACEHOLDER: &str = "%%REPORT_HASH%%";

/// Render the pruned tree into the sealed HTML report.
pub fn export_html(tree_root: &AnalysisNode, source_file_hash: Option<&str>) -> String {
    let profile_node = find_by_title(tree_root, Category::DeponentProfile.lookup_phrase());
    let individuals_node = find_by_title(tree_root, Category::KeyIndividuals.lookup_phrase());
    let main_categories: Vec<&AnalysisNode> = tree_root
        .children
        .iter()
        .filter(|c| c.is_selected)
        .collect();

    let mut toc = String::new();
    if let Some(node) = profile_node {
        toc.push_str(&toc_entry(&node.title));
    }
    if let Some(node) = individuals_node {
        toc.push_str(&toc_entry(&node.title));
    }
    for category in &main_categories {
        toc.push_str(&toc_entry(&category.title));
    }

    let profile_html = profile_node
        .map(|node| {
            format!(
                "<div id=\"{}\" class=\"report-section\">\n<h2>{}</h2>\n<blockquote class=\"profile-quote\"><p>{}</p></blockquote>\n</div>",
                anchor(&node.title),
                node.title,
                node.content.replace('\n', "<br>"),
            )
        })
        .unwrap_or_default();

    let mermaid_html = individuals_node
        .filter(|node| !node.children.is_empty())
        .map(|node| {
            let mut syntax = String::from("mindmap\n  root((Deponent))\n");
            for child in &node.children {
                syntax.push_str(&format!(
                    "    (<strong>{}</strong><br/><i style='font-size: smaller;'>{}</i>)\n",
                    mermaid_sanitize(&child.title),
                    mermaid_sanitize(&child.content),
                ));
            }
            format!(
                "<div id=\"{}\" class=\"report-section\">\n<h2>{}</h2>\n<div class=\"mermaid\">{}</div>\n</div>",
                anchor(&node.title),
                node.title,
                syntax,
            )
        })
        .unwrap_or_default();

    let mut analysis_html = String::new();
    for category in &main_categories {
        let items: String = category.children.iter().map(node_html).collect();
        analysis_html.push_str(&format!(
            "<div id=\"{}\" class=\"report-section\">\n<h2>{}</h2>\n<ul class=\"analysis-list root-list\">{}</ul>\n</div>",
            anchor(&category.title),
            category.title,
            items,
        ));
    }

    let metadata_html = metadata_box(source_file_hash.unwrap_or("N/A"));

    let preliminary = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Analysis Export</title>
<script src="https://cdn.jsdelivr.net/npm/mermaid@10/dist/mermaid.min.js"></script>
<style>{css}</style>
</head>
<body>
<div class="report-container">
<aside class="report-sidebar">
<h2>Table of Contents</h2>
<ul>{toc}</ul>
</aside>
<main class="report-main">
<h1>Deposition Analysis Export</h1>
{metadata}
{profile}
{mermaid}
{analysis}
</main>
</div>
<script>mermaid.initialize({{ startOnLoad: true, theme: 'neutral' }});</script>
</body>
</html>"#,
        css = REPORT_CSS,
        toc = toc,
        metadata = metadata_html,
        profile = profile_html,
        mermaid = mermaid_html,
        analysis = analysis_html,
    );

    let (_, sealed) = seal_document(&preliminary, HTML_HASH_PLACEHOLDER);
    sealed
}

/// Match the node itself, then its direct children, by case-insensitive
/// substring on the title.
fn find_by_title<'a>(node: &'a AnalysisNode, phrase: &str) -> Option<&'a AnalysisNode> {
    if node.title.to_lowercase().contains(&phrase.to_lowercase()) {
        return Some(node);
    }
    tree::child_with_title(node, phrase)
}

fn anchor(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut last_dash = false;
    for c in title.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    out.trim_matches('-').to_string()
}

fn toc_entry(title: &str) -> String {
    format!("<li><a href=\"#{}\">{}</a></li>", anchor(title), title)
}

fn mermaid_sanitize(text: &str) -> String {
    text.replace('"', "#quot;")
}

fn veracity_badge_class(veracity: Veracity) -> &'static str {
    match veracity {
        Veracity::Verified | Veracity::LikelyTrue => "badge-green",
        Veracity::Uncertain => "badge-yellow",
        Veracity::Contradictory | Veracity::Unsupported => "badge-red",
    }
}

/// Render one node (and recursively its children) as report list items.
/// Only explicitly selected nodes get their own section; unselected
/// ancestors contribute structure only.
fn node_html(node: &AnalysisNode) -> String {
    let mut out = String::new();

    if node.is_selected {
        let mut badges = String::new();
        let has_badges = node.veracity.is_some()
            || node.tone.as_ref().is_some_and(|t| !t.is_empty())
            || node.indicators.as_ref().is_some_and(|i| !i.is_empty());
        if has_badges {
            badges.push_str("<div class=\"badges-container\">");
            if let Some(veracity) = node.veracity {
                badges.push_str(&format!(
                    "<span class=\"badge {}\">{}</span>",
                    veracity_badge_class(veracity),
                    veracity.to_string().replace('_', " ").to_lowercase(),
                ));
            }
            if let Some(indicators) = &node.indicators {
                for indicator in indicators {
                    badges.push_str(&format!(
                        "<span class=\"badge badge-violet\">{}</span>",
                        indicator.to_string().to_lowercase(),
                    ));
                }
            }
            if let Some(tone) = &node.tone {
                for keyword in tone {
                    badges.push_str(&format!(
                        "<span class=\"badge badge-slate\">{}</span>",
                        keyword
                    ));
                }
            }
            badges.push_str("</div>");
        }

        let notes = if node.notes.is_empty() {
            String::new()
        } else {
            format!(
                "<div class=\"notes-box\"><h4 class=\"notes-title\">Private Notes</h4><p>{}</p></div>",
                node.notes
            )
        };

        let counter = node
            .alternative
            .as_ref()
            .map(|alt| {
                format!(
                    "<blockquote class=\"counter-quote\"><strong>Counter-Argument:</strong> {}</blockquote>",
                    alt.replace('\n', "<br>")
                )
            })
            .unwrap_or_default();

        let fact_check = node
            .grounding
            .as_ref()
            .map(|grounding| {
                let mut block = format!(
                    "<div class=\"factcheck-box\"><h4 class=\"factcheck-title\">Fact Check Summary</h4><p>{}</p>",
                    grounding.summary
                );
                if !grounding.sources.is_empty() {
                    block.push_str("<h5 class=\"factcheck-sources-title\">Sources:</h5><ul>");
                    for source in &grounding.sources {
                        block.push_str(&format!(
                            "<li><a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">{}</a></li>",
                            source.uri, source.title
                        ));
                    }
                    block.push_str("</ul>");
                }
                block.push_str("</div>");
                block
            })
            .unwrap_or_default();

        out.push_str(&format!(
            "<li class=\"analysis-item\">\n<h3>{}</h3>\n{}\n<p>{}</p>\n{}{}{}\n</li>",
            node.title, badges, node.content, counter, fact_check, notes,
        ));
    }

    if !node.children.is_empty() {
        let children: String = node.children.iter().map(node_html).collect();
        if !children.is_empty() {
            out.push_str(&format!("<ul class=\"analysis-list\">{}</ul>", children));
        }
    }

    out
}

fn metadata_box(source_hash: &str) -> String {
    format!(
        r#"<div class="metadata-box">
<h2>Report Metadata</h2>
<div class="metadata-hashes">
<p><strong>Source Doc Hash (SHA-256):</strong> <span>{source}</span></p>
<p><strong>This Report Hash (SHA-256):</strong> <span>{placeholder}</span></p>
</div>
<div class="metadata-instructions">
<h3>Verification Instructions</h3>
<p><strong>Source:</strong> To verify the integrity of the source document, calculate its SHA-256 hash using a local tool and compare it to the hash above.</p>
<p><strong>Report:</strong> To verify this report, replace the report hash above with an empty string, calculate the SHA-256 hash of the result, and compare.</p>
</div>
</div>"#,
        source = source_hash,
        placeholder = HTML_HASH_PLACEHOLDER,
    )
}

const REPORT_CSS: &str = r#"
body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, "Helvetica Neue", Arial, sans-serif; line-height: 1.6; color: #374151; margin: 0; background-color: #f9fafb; }
.report-container { display: flex; }
.report-sidebar { width: 280px; position: fixed; top: 0; left: 0; height: 100vh; background: #ffffff; padding: 1.5rem; overflow-y: auto; border-right: 1px solid #e5e7eb; box-shadow: 2px 0 10px rgba(0,0,0,0.05); }
.report-sidebar h2 { font-size: 1.25rem; color: #111827; margin-top: 0; border-bottom: 1px solid #e5e7eb; padding-bottom: 0.75rem; }
.report-sidebar ul { list-style: none; padding: 0; margin-top: 1rem; }
.report-sidebar li a { color: #4b5563; text-decoration: none; display: block; padding: 0.5rem 0.75rem; border-radius: 0.375rem; font-weight: 500; }
.report-sidebar li a:hover { background-color: #f3f4f6; color: #1e40af; }
.report-main { margin-left: 280px; padding: 2rem 3.5rem; width: calc(100% - 280px); }
h1 { font-size: 2.25rem; color: #1e3a8a; margin-bottom: 1rem; }
h2 { font-size: 1.75rem; color: #1e40af; border-bottom: 2px solid #dbeafe; padding-bottom: 0.5rem; margin-top: 2rem; margin-bottom: 1.5rem; }
h3 { font-size: 1.25rem; color: #1e3a8a; margin-top: 0; }
p { margin-top: 4px; } a { color: #0c4a6e; }
.report-section { margin-bottom: 2rem; }
.metadata-box { background-color: #f8fafc; border: 1px solid #e2e8f0; padding: 1.5rem; border-radius: 0.5rem; margin-bottom: 2rem; }
.metadata-hashes { font-family: monospace; font-size: 0.875rem; color: #475569; word-break: break-all; margin-bottom: 1.5rem; }
.metadata-hashes p { margin: 0.5rem 0; }
.metadata-instructions h3 { font-size: 1rem; color: #334155; margin: 0 0 0.5rem 0; }
.metadata-instructions p { font-size: 0.875rem; margin: 0.25rem 0; }
.profile-quote { background-color: #f0f9ff; border-left: 4px solid #0ea5e9; margin: 1rem 0; padding: 0.5rem 1.5rem; font-style: italic; }
.mermaid { background: #fdfdfd; padding: 1rem; border-radius: 0.5rem; text-align: center; border: 1px solid #e2e8f0; }
.analysis-list { padding-left: 20px; list-style-type: none; border-left: 1px solid #e5e7eb; }
.root-list { border-left: none; padding-left: 0; }
.analysis-item { margin-bottom: 1.5rem; position: relative; padding-left: 1.5rem; }
.analysis-item::before { content: ''; position: absolute; left: -20px; top: 8px; width: 12px; height: 12px; border: 2px solid #93c5fd; background: #fff; border-radius: 50%; }
.analysis-item h3 { margin-bottom: 0.5rem; }
.badges-container { display: flex; gap: 8px; margin-top: 8px; flex-wrap: wrap; }
.badge { padding: 2px 10px; border-radius: 9999px; font-size: 12px; font-weight: 600; text-transform: capitalize; border: 1px solid transparent; }
.badge-green { background-color: #dcfce7; color: #166534; border-color: #86efac; }
.badge-yellow { background-color: #fef9c3; color: #854d0e; border-color: #fde047; }
.badge-red { background-color: #fee2e2; color: #991b1b; border-color: #fca5a5; }
.badge-violet { background-color: #ede9fe; color: #5b21b6; border-color: #c4b5fd; }
.badge-slate { background-color: #e2e8f0; color: #334155; }
.notes-box { margin-top: 12px; padding: 12px; background-color: #f3f4f6; border-radius: 4px; border: 1px solid #d1d5db; }
.notes-box h4 { margin:0 0 8px 0; font-weight: bold; color: #4b5563; }
.notes-box p { margin:0; white-space: pre-wrap; }
.counter-quote { background-color: #fef9c3; border-left: 4px solid #f59e0b; margin: 1rem 0; padding: 0.5rem 1rem; }
.factcheck-box { margin-top: 12px; padding: 12px; background-color: #e0f2fe; border-radius: 4px; border: 1px solid #7dd3fc; }
.factcheck-box h4, .factcheck-box h5 { margin:0 0 8px 0; font-weight: bold; color: #075985; }
"#;
