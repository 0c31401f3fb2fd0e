use autodoc_structure::{
    ExtractorConfig, FileInfo, GrammarParser, LexicalParser, SourceParser, Visibility,
};
use pretty_assertions::assert_eq;
use std::path::Path;

const SAMPLE: &str = r#"
#include <vector>
#include "widget.h"

namespace demo {

class Shape {
public:
    virtual double area() const;
    static int count();
private:
    int id_;
};

class Circle : public Shape {
public:
    double area() const override;
    void scale(double factor);
};

int helper(int x) {
    return x * 2;
}

}
"#;

/// Strategy-independent view of a parse result
#[derive(Debug, PartialEq)]
struct Outline {
    classes: Vec<(String, Vec<String>, Vec<(String, bool, bool, bool, Visibility)>)>,
    functions: Vec<(String, String)>,
    includes: Vec<String>,
}

fn outline(info: &FileInfo) -> Outline {
    Outline {
        classes: info
            .classes
            .iter()
            .map(|class| {
                (
                    class.name.clone(),
                    class.base_classes.clone(),
                    class
                        .methods
                        .iter()
                        .map(|m| (m.name.clone(), m.is_const, m.is_static, m.is_virtual, m.visibility))
                        .collect(),
                )
            })
            .collect(),
        functions: info
            .functions
            .iter()
            .map(|f| (f.name.clone(), f.return_type.clone()))
            .collect(),
        includes: info.includes.clone(),
    }
}

fn parsers() -> Vec<Box<dyn SourceParser>> {
    let config = ExtractorConfig::default();
    vec![
        Box::new(GrammarParser::new(&config).expect("grammar loads")),
        Box::new(LexicalParser::new(&config)),
    ]
}

#[test]
fn every_parser_reports_the_expected_outline() {
    let expected = Outline {
        classes: vec![
            (
                "Shape".to_string(),
                vec![],
                vec![
                    ("area".to_string(), true, false, true, Visibility::Public),
                    ("count".to_string(), false, true, false, Visibility::Public),
                ],
            ),
            (
                "Circle".to_string(),
                vec!["Shape".to_string()],
                vec![
                    ("area".to_string(), true, false, false, Visibility::Public),
                    ("scale".to_string(), false, false, false, Visibility::Public),
                ],
            ),
        ],
        functions: vec![("helper".to_string(), "int".to_string())],
        includes: vec!["vector".to_string(), "widget.h".to_string()],
    };

    for parser in parsers() {
        let info = parser.parse(Path::new("shapes.h"), SAMPLE).unwrap();
        assert_eq!(outline(&info), expected, "parser: {}", parser.kind().as_str());
        assert_eq!(info.path, Path::new("shapes.h"));
    }
}

#[test]
fn every_parser_tolerates_empty_input() {
    for parser in parsers() {
        let info = parser.parse(Path::new("empty.cpp"), "").unwrap();
        assert!(!info.has_entities(), "parser: {}", parser.kind().as_str());
        assert!(info.includes.is_empty());
    }
}

#[test]
fn snippets_are_bounded() {
    let body: String = (0..200).map(|i| format!("    void m{i}();\n")).collect();
    let source = format!("class Big {{\npublic:\n{body}}};\n");

    for parser in parsers() {
        let info = parser.parse(Path::new("big.h"), &source).unwrap();
        assert_eq!(info.classes.len(), 1);
        assert!(info.classes[0].snippet.chars().count() <= 500);
        assert!(info.classes[0].snippet.starts_with("class Big"));
    }
}
