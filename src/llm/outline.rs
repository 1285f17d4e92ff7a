//! Path- and manifest-derived facts about a project, computed locally before
//! anything is sent to the generator.

use super::schema::ProjectStage;
use crate::domain::FileRecord;
use crate::rank::{file_priority, is_entry_point, tier};
use crate::utils::{basename, normalize_path};
use serde_json::Value;
use std::collections::BTreeSet;

const DEPLOY_CONFIG_FILES: &[&str] = &[
    "dockerfile",
    "docker-compose.yml",
    "docker-compose.yaml",
    "vercel.json",
    "netlify.toml",
    "fly.toml",
    "render.yaml",
    "procfile",
    "app.yaml",
];

/// Source extensions and the language they indicate.
const LANGUAGE_EXTENSIONS: &[(&str, &str)] = &[
    ("ts", "TypeScript"),
    ("tsx", "TypeScript"),
    ("js", "JavaScript"),
    ("jsx", "JavaScript"),
    ("mjs", "JavaScript"),
    ("cjs", "JavaScript"),
    ("py", "Python"),
    ("rs", "Rust"),
    ("go", "Go"),
    ("rb", "Ruby"),
    ("java", "Java"),
    ("kt", "Kotlin"),
    ("swift", "Swift"),
    ("php", "PHP"),
    ("cs", "C#"),
    ("vue", "Vue"),
    ("svelte", "Svelte"),
    ("dart", "Dart"),
];

/// Manifest basenames and the technology they indicate.
const MANIFEST_MARKERS: &[(&str, &str)] = &[
    ("package.json", "Node.js"),
    ("cargo.toml", "Rust"),
    ("pyproject.toml", "Python"),
    ("requirements.txt", "Python"),
    ("go.mod", "Go"),
    ("gemfile", "Ruby"),
    ("pom.xml", "Java"),
    ("composer.json", "PHP"),
    ("pubspec.yaml", "Flutter"),
    ("dockerfile", "Docker"),
];

/// npm dependencies worth naming in the stack.
const NPM_MARKERS: &[(&str, &str)] = &[
    ("next", "Next.js"),
    ("react", "React"),
    ("vue", "Vue"),
    ("svelte", "Svelte"),
    ("@angular/core", "Angular"),
    ("express", "Express"),
    ("@nestjs/core", "NestJS"),
    ("tailwindcss", "Tailwind CSS"),
    ("prisma", "Prisma"),
    ("@prisma/client", "Prisma"),
    ("@supabase/supabase-js", "Supabase"),
    ("typescript", "TypeScript"),
];

/// Overview of a project's layout, derived from paths alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectOutline {
    pub folders: Vec<String>,
    pub entry_points: Vec<String>,
    pub has_manifest: bool,
    pub has_deploy_config: bool,
    pub has_tests: bool,
    pub has_docs: bool,
}

impl ProjectOutline {
    pub fn from_files(files: &[FileRecord]) -> Self {
        let mut folders = BTreeSet::new();
        let mut outline = ProjectOutline::default();

        for file in files {
            let path = normalize_path(&file.path).to_lowercase();
            let name = basename(&path);
            if let Some((top, _)) = path.split_once('/') {
                folders.insert(top.to_string());
            }
            if is_entry_point(&path) {
                outline.entry_points.push(file.path.clone());
            }
            outline.has_manifest |= file_priority(&path) == tier::ESSENTIAL && !name.starts_with("readme");
            outline.has_deploy_config |=
                DEPLOY_CONFIG_FILES.contains(&name) || path.starts_with(".github/workflows/");
            outline.has_tests |= path
                .split('/')
                .any(|part| matches!(part, "test" | "tests" | "__tests__" | "spec"))
                || name.contains(".test.")
                || name.contains(".spec.")
                || name.contains("_test.");
            outline.has_docs |= name.starts_with("readme") || path.starts_with("docs/");
        }

        outline.folders = folders.into_iter().collect();
        outline
    }
}

fn language_of(name: &str) -> Option<&'static str> {
    let (_, ext) = name.rsplit_once('.')?;
    LANGUAGE_EXTENSIONS.iter().find(|(e, _)| *e == ext).map(|(_, lang)| *lang)
}

/// Dependency names declared in a `package.json`. Unparseable manifests
/// contribute nothing.
fn npm_dependencies(content: &str) -> Vec<String> {
    let Ok(manifest) = serde_json::from_str::<Value>(content) else {
        return Vec::new();
    };
    ["dependencies", "devDependencies"]
        .iter()
        .filter_map(|section| manifest.get(section)?.as_object())
        .flat_map(|deps| deps.keys().cloned())
        .collect()
}

/// Technologies evident from file extensions, manifests and `package.json`
/// dependencies, sorted and deduplicated.
pub fn detect_tech_stack(files: &[FileRecord]) -> Vec<String> {
    let mut stack = BTreeSet::new();

    for file in files {
        let path = normalize_path(&file.path).to_lowercase();
        let name = basename(&path);

        if let Some(lang) = language_of(name) {
            stack.insert(lang);
        }
        if let Some((_, tech)) = MANIFEST_MARKERS.iter().find(|(marker, _)| *marker == name) {
            stack.insert(*tech);
        }
        if name == "package.json" {
            for dep in npm_dependencies(&file.content) {
                if let Some((_, tech)) = NPM_MARKERS.iter().find(|(marker, _)| *marker == dep) {
                    stack.insert(*tech);
                }
            }
        }
    }

    stack.into_iter().map(str::to_string).collect()
}

/// First guess at the project stage from its files. Revenue cannot be seen in
/// a repository, so `Growing` is never guessed.
pub fn detect_stage(files: &[FileRecord], outline: &ProjectOutline) -> ProjectStage {
    if files.is_empty() {
        return ProjectStage::Unknown;
    }
    let has_code = files
        .iter()
        .any(|file| language_of(basename(&normalize_path(&file.path).to_lowercase())).is_some());
    match (has_code, outline.has_deploy_config) {
        (false, _) => ProjectStage::Documentation,
        (true, false) => ProjectStage::Mvp,
        (true, true) => ProjectStage::Launched,
    }
}
