//! Python syntax helpers over ast-grep.
//!
//! Only the shapes the scanner and the source importer care about are
//! modelled: top-level function definitions and their decorator lists.

use ast_grep_core::tree_sitter::StrDoc;
use ast_grep_core::Node;
use ast_grep_language::{LanguageExt, SupportLang};

use crate::options::SPLAT_KEY;

/// The concrete tree type produced by [`parse_python`].
pub type PythonTree = ast_grep_core::AstGrep<StrDoc<SupportLang>>;

/// Parse Python source, rejecting trees that contain error nodes.
///
/// tree-sitter recovers from bad input; a module the interpreter would refuse
/// must fail here too. Error nodes, inserted MISSING tokens, and Python 2
/// statement forms are all reported with their line.
pub fn parse_python(source: &str) -> Result<PythonTree, String> {
    let tree = SupportLang::Python.ast_grep(source);
    let error_line = first_error_line(&tree.root());
    match error_line {
        Some(line) => Err(format!("invalid syntax near line {}", line + 1)),
        None => Ok(tree),
    }
}

/// Statement forms the grammar still accepts but Python 3 rejects.
const LEGACY_STATEMENTS: &[&str] = &["print_statement", "exec_statement"];

fn first_error_line<D: ast_grep_core::Doc>(node: &Node<D>) -> Option<usize> {
    if node.is_error() || node.is_missing() || LEGACY_STATEMENTS.contains(&node.kind().as_ref()) {
        return Some(node.start_pos().line());
    }
    node.children().find_map(|child| first_error_line(&child))
}

/// A top-level function carrying the marker decorator.
pub struct MarkedFunction<'r, D: ast_grep_core::Doc> {
    pub name: String,
    /// 1-based line of the `def` keyword.
    pub line: usize,
    /// The matching decorator's expression (`njit` or `njit(...)`).
    pub decorator: Node<'r, D>,
}

/// Collect top-level functions whose decorator list carries `marker`.
///
/// Nested functions and class methods are never visited. Each function is
/// reported once, with the first matching decorator.
pub fn marked_functions<'r, D: ast_grep_core::Doc>(
    root: &Node<'r, D>,
    marker: &str,
) -> Vec<MarkedFunction<'r, D>> {
    let mut found = Vec::new();
    for child in root.children() {
        if child.kind().as_ref() != "decorated_definition" {
            continue;
        }
        let Some(definition) = child.field("definition") else {
            continue;
        };
        if definition.kind().as_ref() != "function_definition" || is_async(&definition) {
            continue;
        }
        let Some(name) = definition.field("name").map(|n| n.text().to_string()) else {
            continue;
        };

        let decorator = child
            .children()
            .filter(|c| c.kind().as_ref() == "decorator")
            .filter_map(|c| decorator_expression(&c))
            .find(|expr| decorator_name(expr).as_deref() == Some(marker));

        if let Some(decorator) = decorator {
            found.push(MarkedFunction {
                name,
                line: definition.start_pos().line() + 1,
                decorator,
            });
        }
    }
    found
}

fn is_async<D: ast_grep_core::Doc>(definition: &Node<D>) -> bool {
    definition.children().any(|c| c.kind().as_ref() == "async")
}

/// The expression following `@` in a decorator node.
fn decorator_expression<'r, D: ast_grep_core::Doc>(decorator: &Node<'r, D>) -> Option<Node<'r, D>> {
    decorator.children().find(|c| {
        let kind = c.kind();
        kind.as_ref() != "@" && kind.as_ref() != "comment"
    })
}

/// Name of a decorator expression: the identifier itself when bare, or the
/// callee when it is a call on a bare identifier. Surrounding parentheses
/// are ignored. Dotted access, subscripts and lambdas have no name.
pub fn decorator_name<D: ast_grep_core::Doc>(expr: &Node<D>) -> Option<String> {
    if expr.kind().as_ref() == "parenthesized_expression" {
        return decorator_name(&unparenthesize(expr)?);
    }
    match expr.kind().as_ref() {
        "identifier" => Some(expr.text().to_string()),
        "call" => {
            let callee = expr.field("function")?;
            if callee.kind().as_ref() == "identifier" {
                Some(callee.text().to_string())
            } else {
                None
            }
        }
        _ => None,
    }
}

/// The expression inside `( ... )`.
fn unparenthesize<'r, D: ast_grep_core::Doc>(expr: &Node<'r, D>) -> Option<Node<'r, D>> {
    expr.children().find(|c| {
        let kind = c.kind();
        kind.as_ref() != "(" && kind.as_ref() != ")" && kind.as_ref() != "comment"
    })
}

/// Keyword arguments of a call-form decorator as `(name, value node)` pairs.
///
/// A bare decorator has no arguments. Positional arguments (explicit
/// signatures) are ignored. A `**mapping` argument is kept under
/// [`SPLAT_KEY`] with the splat node itself as its value.
pub fn keyword_arguments<'r, D: ast_grep_core::Doc>(expr: &Node<'r, D>) -> Vec<(String, Node<'r, D>)> {
    if expr.kind().as_ref() == "parenthesized_expression" {
        return unparenthesize(expr).map(|inner| keyword_arguments(&inner)).unwrap_or_default();
    }
    if expr.kind().as_ref() != "call" {
        return Vec::new();
    }
    let Some(arguments) = expr.field("arguments") else {
        return Vec::new();
    };
    arguments
        .children()
        .filter_map(|arg| match arg.kind().as_ref() {
            "keyword_argument" => {
                let name = arg.field("name")?.text().to_string();
                let value = arg.field("value")?;
                Some((name, value))
            }
            "dictionary_splat" => Some((SPLAT_KEY.to_string(), arg)),
            _ => None,
        })
        .collect()
}
