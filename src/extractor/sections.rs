use regex::Regex;
use std::sync::LazyLock;

use crate::extractor::model::single_line;

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s{0,3}#{1,6}\s+(.+?)\s*#*\s*$").unwrap());
static BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*+]|\d+[.)])\s+(.+)$").unwrap());
static EMPHASIS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*|__|`").unwrap());
/// A standalone label line such as `**Requirements:**` or `Dependencies:`.
static LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^\s*(?:\*\*|__)?([A-Za-z][A-Za-z ,&-]{0,40}?)",
        r"\s*(?::\s*(?:\*\*|__)?|(?:\*\*|__)\s*:)\s*$",
    ))
    .unwrap()
});
static PIP_INSTALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bpip3?\s+install\s+([^\n#;&|]+)").unwrap());

const MAX_ITEMS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    PrimaryUses,
    OutOfScope,
    Bias,
    Limitations,
    Requirements,
}

/// Bullet lists found under the documentation headings of a markdown file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentedSections {
    pub primary_uses: Vec<String>,
    pub out_of_scope: Vec<String>,
    pub bias_analysis: Vec<String>,
    pub limitations: Vec<String>,
    /// Listed requirements followed by packages named in `pip install` lines.
    pub requirements: Vec<String>,
}

impl DocumentedSections {
    fn list_mut(&mut self, section: Section) -> &mut Vec<String> {
        match section {
            Section::PrimaryUses => &mut self.primary_uses,
            Section::OutOfScope => &mut self.out_of_scope,
            Section::Bias => &mut self.bias_analysis,
            Section::Limitations => &mut self.limitations,
            Section::Requirements => &mut self.requirements,
        }
    }
}

fn classify(heading: &str) -> Option<Section> {
    let heading = heading.to_lowercase();
    // "Out-of-scope use" must not land in primary uses.
    if heading.contains("out-of-scope")
        || heading.contains("out of scope")
        || heading.contains("misuse")
    {
        Some(Section::OutOfScope)
    } else if heading.contains("intended use") || heading.contains("direct use") {
        Some(Section::PrimaryUses)
    } else if heading.contains("bias") {
        Some(Section::Bias)
    } else if heading.contains("limitation") {
        Some(Section::Limitations)
    } else if heading.contains("requirement") || heading.contains("dependencies") {
        Some(Section::Requirements)
    } else {
        None
    }
}

fn push_unique(list: &mut Vec<String>, item: String) {
    if !item.is_empty() && list.len() < MAX_ITEMS && !list.contains(&item) {
        list.push(item);
    }
}

pub fn scan_sections(markdown: &str) -> DocumentedSections {
    let mut found = DocumentedSections::default();
    let mut current = None;
    let mut in_fence = false;

    for line in markdown.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
            continue;
        }
        // Shell comments inside code blocks look like headings.
        if in_fence {
            continue;
        }
        if let Some(caps) = HEADING.captures(line) {
            current = classify(&caps[1]);
            continue;
        }
        if let Some(caps) = BULLET.captures(line) {
            if let Some(section) = current {
                let item = single_line(&EMPHASIS.replace_all(&caps[1], ""));
                push_unique(found.list_mut(section), item);
            }
            continue;
        }
        if let Some(section) = LABEL.captures(line).and_then(|caps| classify(&caps[1])) {
            current = Some(section);
        }
    }

    for package in install_packages(markdown) {
        push_unique(&mut found.requirements, package);
    }
    found
}

/// Package names from `pip install` commands. Flags and requirement files are
/// skipped.
pub fn install_packages(text: &str) -> Vec<String> {
    let mut packages = Vec::new();
    for caps in PIP_INSTALL.captures_iter(text) {
        for token in caps[1].split_whitespace() {
            let token = token.trim_matches(|c| matches!(c, '`' | '"' | '\''));
            if token.is_empty()
                || token.starts_with('-')
                || token.ends_with(".txt")
                || token == "."
            {
                continue;
            }
            if !packages.iter().any(|p| p == token) {
                packages.push(token.to_string());
            }
        }
    }
    packages
}

#[cfg(test)]
mod tests {
    use super::*;

    const CARD: &str = "\
# DermNet-X

## Intended Use
- Triage support for **dermatologists**
- Research on lesion classification

## Out-of-Scope Use
* Direct diagnosis without clinical oversight

## Bias, Risks, and Limitations
- Under-represents Fitzpatrick V-VI skin types

### Limitations
1. Trained on dermoscopic images only

## Training
- Not a documentation bullet
";

    #[test]
    fn bullets_land_in_their_sections() {
        let sections = scan_sections(CARD);
        assert_eq!(
            sections.primary_uses,
            vec!["Triage support for dermatologists", "Research on lesion classification"]
        );
        assert_eq!(sections.out_of_scope, vec!["Direct diagnosis without clinical oversight"]);
        assert_eq!(sections.bias_analysis, vec!["Under-represents Fitzpatrick V-VI skin types"]);
        assert_eq!(sections.limitations, vec!["Trained on dermoscopic images only"]);
    }

    #[test]
    fn text_without_headings_yields_nothing() {
        assert_eq!(scan_sections("- a stray bullet\nplain text"), DocumentedSections::default());
    }

    #[test]
    fn requirement_bullets_and_install_lines_are_collected() {
        let readme = "\
# DermNet-X

**Requirements:**
- Python 3.8+
- PyTorch 1.9+

## Installation
```bash
# Install dependencies
pip install torch torchvision `timm` -r requirements.txt
```

## Usage
- Run `predict.py`
";
        let sections = scan_sections(readme);
        assert_eq!(
            sections.requirements,
            vec!["Python 3.8+", "PyTorch 1.9+", "torch", "torchvision", "timm"]
        );
        assert!(sections.primary_uses.is_empty());
    }

    #[test]
    fn install_flags_and_files_are_skipped() {
        assert_eq!(
            install_packages("pip3 install -e . && pip install -U scikit-learn==1.3"),
            vec!["scikit-learn==1.3"]
        );
        assert!(install_packages("no install commands here").is_empty());
    }
}
