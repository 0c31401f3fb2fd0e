//! Prompt text for each artifact kind.
//!
//! Prompts are pure functions of their inputs. Paths are rendered relative to
//! the project root so generation keys survive moving the checkout.

use autodoc_structure::{
    render_parameters, ClassEntity, FileInfo, FunctionEntity, MethodEntity, Module,
    ProjectStructure, SourceKind,
};
use std::fmt::Write as _;
use std::path::Path;

const MAX_LISTED_FILES: usize = 20;
const MAX_SIBLING_MODULES: usize = 10;

const MARKDOWN_ONLY: &str = "Generate ONLY the markdown content, no additional commentary.";

pub fn getting_started(project: &ProjectStructure) -> String {
    format!(
        "Analyze this C++ project structure and write a getting started guide.

# Project Structure
{summary}

# Your Task
Write a short introduction (about 300 words) covering:
1. **Main Purpose**: what the project is for and which problems it solves
2. **Core Architecture**: the 3-5 main modules and what each does
3. **Entry Points**: where a new developer should start reading
4. **Technology Stack**: C++ standard, key libraries, build system, test framework

# Output Format
A Markdown document with clear headings, bullet points and one Mermaid diagram of the
high-level architecture.

{MARKDOWN_ONLY}
",
        summary = summarize_structure(project)
    )
}

pub fn architecture(project: &ProjectStructure) -> String {
    format!(
        "Analyze this C++ project and write architecture documentation.

# Project Structure
{summary}

# Modules
{modules}

# Dependencies
{dependencies}

# Your Task
Cover:
1. **Architecture Overview**: overall pattern and key design decisions
2. **Component Breakdown**: purpose, key classes and interactions of each module
3. **Data Flow**: how data moves through the system
4. **Design Patterns**: patterns in use and where
5. **Threading and Concurrency**: if applicable

Refer to modules as \"<name> module\" so they can be cross-linked.

# Output Format
A Markdown document with sections, Mermaid diagrams and short code snippets.

{MARKDOWN_ONLY}
",
        summary = summarize_structure(project),
        modules = format_modules(project),
        dependencies = format_dependencies(project),
    )
}

/// Prompt for a module previously filled in by `StructureExtractor::hydrate_module`
pub fn module(module: &Module, project: &ProjectStructure) -> String {
    format!(
        "Analyze this C++ module and write module-level documentation.

# Module Information
**Name**: {name}
**Path**: {path}
**Files**: {count} files

## Files in Module
{files}

## Classes Identified
{classes}

## Dependencies
{dependencies}

# Project Context
{context}

# Your Task
1. **Overview**: purpose of the module and how it fits the system
2. **Main Classes and Responsibilities**: one short paragraph per major class
3. **Usage**: typical workflow with a short code example
4. **Relationships**: dependencies on and from other modules

{MARKDOWN_ONLY}
",
        name = module.name,
        path = display_relative(project, &module.path),
        count = module.files.len(),
        files = format_file_list(project, &module.files),
        classes = format_class_list(&module.classes),
        dependencies = bullet_list(&module.dependencies, "No local dependencies detected."),
        context = format_sibling_modules(project, &module.name),
    )
}

pub fn class(class: &ClassEntity, file: &FileInfo, project: &ProjectStructure) -> String {
    let bases = if class.base_classes.is_empty() {
        "None".to_string()
    } else {
        class.base_classes.join(", ")
    };
    format!(
        "Analyze this C++ class and write API documentation.

# Class Information
**Name**: {name}
**File**: {path}
**Base Classes**: {bases}
**Methods**: {count} methods

## Header Code
```cpp
{snippet}
```

## Methods
{methods}

# Your Task
1. **Class Overview**: purpose, responsibilities and when to use it
2. **Constructors**: signatures, parameters and an example
3. **Public Methods**: for each method the signature, description, parameters, return
   value, errors and an example
4. **Usage Examples**: one complete example
5. **Notes**: thread safety, ownership and performance

{MARKDOWN_ONLY}
",
        name = class.name,
        path = display_relative(project, &file.path),
        count = class.methods.len(),
        snippet = class.snippet,
        methods = format_methods(&class.methods),
    )
}

pub fn functions(functions: &[FunctionEntity], file: &FileInfo, project: &ProjectStructure) -> String {
    let mut listing = String::new();
    for function in functions {
        let _ = write!(
            listing,
            "### {name}\n`{ret} {name}({params})`\n```cpp\n{snippet}\n```\n\n",
            name = function.name,
            ret = function.return_type,
            params = render_parameters(&function.parameters),
            snippet = function.snippet,
        );
    }

    format!(
        "Document the free functions defined in this C++ file.

# File
**Path**: {path}
**Functions**: {count}

# Functions
{listing}
# Your Task
For each function give the signature, a description, parameters, return value,
errors and a short example. Group related functions together.

{MARKDOWN_ONLY}
",
        path = display_relative(project, &file.path),
        count = functions.len(),
    )
}

fn summarize_structure(project: &ProjectStructure) -> String {
    let headers = project
        .files
        .iter()
        .filter(|file| SourceKind::from_path(file) == SourceKind::Header)
        .count();
    let sources = project
        .files
        .iter()
        .filter(|file| SourceKind::from_path(file) == SourceKind::Implementation)
        .count();

    let mut out = format!(
        "**Total Files**: {}\n**Modules**: {}\n**Header Files**: {headers}\n**Source Files**: {sources}\n",
        project.files.len(),
        project.modules.len()
    );
    if !project.directory_tree.is_empty() {
        let _ = write!(out, "\n**Directory Structure**:\n```\n{}\n```\n", project.directory_tree);
    }
    out
}

fn format_modules(project: &ProjectStructure) -> String {
    if project.modules.is_empty() {
        return "No modules detected.".to_string();
    }
    project
        .modules
        .iter()
        .map(|module| {
            format!(
                "- **{}**: {} files\n  - Path: `{}`",
                module.name,
                module.files.len(),
                display_relative(project, &module.path)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_dependencies(project: &ProjectStructure) -> String {
    let deps = &project.dependencies;
    if deps.is_empty() {
        return "No external dependencies detected.".to_string();
    }
    let mut lines = Vec::new();
    if !deps.system.is_empty() {
        lines.push(format!("**System**: {}", join_set(&deps.system)));
    }
    if !deps.local.is_empty() {
        lines.push(format!("**Local**: {}", join_set(&deps.local)));
    }
    lines.join("\n")
}

fn format_file_list(project: &ProjectStructure, files: &[std::path::PathBuf]) -> String {
    let mut lines: Vec<String> = files
        .iter()
        .take(MAX_LISTED_FILES)
        .map(|file| format!("- `{}`", display_relative(project, file)))
        .collect();
    if files.len() > MAX_LISTED_FILES {
        lines.push(format!("- ... and {} more files", files.len() - MAX_LISTED_FILES));
    }
    if lines.is_empty() {
        return "No files.".to_string();
    }
    lines.join("\n")
}

fn format_class_list(classes: &[ClassEntity]) -> String {
    if classes.is_empty() {
        return "No classes detected.".to_string();
    }
    classes
        .iter()
        .map(|class| format!("- **{}**: {} methods", class.name, class.methods.len()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_sibling_modules(project: &ProjectStructure, current: &str) -> String {
    let siblings: Vec<&Module> = project
        .modules
        .iter()
        .filter(|module| module.name != current)
        .collect();
    if siblings.is_empty() {
        return "This is the only module in the project.".to_string();
    }
    let mut lines = vec!["**Other modules in the project**:".to_string()];
    lines.extend(
        siblings
            .iter()
            .take(MAX_SIBLING_MODULES)
            .map(|module| format!("- {}: {} files", module.name, module.files.len())),
    );
    lines.join("\n")
}

fn format_methods(methods: &[MethodEntity]) -> String {
    if methods.is_empty() {
        return "No methods detected.".to_string();
    }
    methods
        .iter()
        .map(|method| {
            let mut qualifiers = Vec::new();
            if method.is_static {
                qualifiers.push("static");
            }
            if method.is_virtual {
                qualifiers.push("virtual");
            }
            if method.is_const {
                qualifiers.push("const");
            }
            let qualifiers = if qualifiers.is_empty() {
                String::new()
            } else {
                format!(" [{}]", qualifiers.join(", "))
            };
            format!(
                "- ({}) `{} {}({})`{qualifiers}",
                method.visibility.as_str(),
                method.return_type,
                method.name,
                render_parameters(&method.parameters)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn bullet_list(items: &[String], empty: &str) -> String {
    if items.is_empty() {
        return empty.to_string();
    }
    items
        .iter()
        .map(|item| format!("- {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn join_set(items: &std::collections::BTreeSet<String>) -> String {
    items.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

fn display_relative(project: &ProjectStructure, path: &Path) -> String {
    let relative = project.relative(path);
    let shown = relative.to_string_lossy().replace('\\', "/");
    if shown.is_empty() {
        ".".to_string()
    } else {
        shown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autodoc_structure::{DependencySummary, Parameter, Visibility};
    use std::path::PathBuf;

    fn project() -> ProjectStructure {
        let mut module = Module::new("a", "/src/a");
        module.files = (0..25).map(|i| PathBuf::from(format!("/src/a/f{i}.h"))).collect();
        let mut siblings: Vec<Module> = (0..12)
            .map(|i| {
                let mut m = Module::new(format!("m{i}"), format!("/src/m{i}"));
                m.files.push(PathBuf::from(format!("/src/m{i}/x.cpp")));
                m
            })
            .collect();
        let mut modules = vec![module];
        modules.append(&mut siblings);
        ProjectStructure {
            root: PathBuf::from("/src"),
            files: modules.iter().flat_map(|m| m.files.clone()).collect(),
            modules,
            dependencies: DependencySummary::default(),
            directory_tree: "a/\n  f0.h".to_string(),
        }
    }

    #[test]
    fn module_prompt_bounds_lists_and_uses_relative_paths() {
        let project = project();
        let prompt = module(&project.modules[0], &project);
        assert!(prompt.contains("- `a/f19.h`"));
        assert!(!prompt.contains("a/f20.h"));
        assert!(prompt.contains("... and 5 more files"));
        assert!(prompt.contains("- m9: 1 files"));
        assert!(!prompt.contains("- m10:"));
        assert!(!prompt.contains("/src/"));
    }

    #[test]
    fn prompts_are_deterministic() {
        let project = project();
        assert_eq!(getting_started(&project), getting_started(&project));
        assert!(architecture(&project).contains("**Header Files**: 25"));
    }

    #[test]
    fn class_prompt_lists_method_qualifiers() {
        let project = project();
        let class = ClassEntity {
            name: "Foo".to_string(),
            methods: vec![MethodEntity {
                name: "bar".to_string(),
                return_type: "int".to_string(),
                parameters: vec![Parameter::new("double", "x")],
                visibility: Visibility::Public,
                is_const: true,
                is_static: false,
                is_virtual: true,
            }],
            base_classes: vec![],
            snippet: "class Foo {};".to_string(),
        };
        let file = FileInfo::new("/src/a/f0.h");
        let prompt = super::class(&class, &file, &project);
        assert!(prompt.contains("- (public) `int bar(double x)` [virtual, const]"));
        assert!(prompt.contains("**File**: a/f0.h"));
        assert!(prompt.contains("**Base Classes**: None"));
    }
}
