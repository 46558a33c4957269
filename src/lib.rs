extern crate wasm_bindgen;

use wasm_bindgen::prelude::*;

pub mod earley;
pub mod error;
pub mod grammar;
pub mod lr1;
pub mod scanner;
pub mod tree;
pub mod unger;

pub use earley::{Chart, EarleyParser, Forest};
pub use error::{AutomatonConflict, Error, GrammarError, ParseError, ScanError};
pub use grammar::{Grammar, GrammarBuilder};
pub use lr1::{Lr1Automaton, ParsingTable};
pub use scanner::{CharScanner, Scanner, Token, TokenStream, WordScanner};
pub use tree::ParseTree;
pub use unger::UngerParser;

fn json_or_error(result: Result<String, Error>) -> String {
    match result {
        Ok(json) => json,
        Err(e) => serde_json::json!({ "error": e.to_string() }).to_string(),
    }
}

#[wasm_bindgen]
pub fn nullable_first_follow_to_json(grammar: &str) -> String {
    json_or_error(
        Grammar::parse(grammar)
            .map_err(Error::from)
            .and_then(|g| Ok(g.to_non_terminal_output_vec().to_json()?)),
    )
}

/// Earley forest of `input`. With `words` the input is split on whitespace,
/// otherwise every character is a token.
#[wasm_bindgen]
pub fn earley_forest_to_json(grammar: &str, input: &str, words: bool) -> String {
    json_or_error((|| -> Result<String, Error> {
        let g = Grammar::parse(grammar)?;
        let parser = EarleyParser::new(&g);
        let forest = if words {
            parser.parse(WordScanner::new(input))?
        } else {
            parser.parse(CharScanner::new(input))?
        };
        Ok(forest.to_json()?)
    })())
}

#[wasm_bindgen]
pub fn lr1_automaton_to_json(grammar: &str) -> String {
    json_or_error((|| -> Result<String, Error> {
        let g = Grammar::parse(grammar)?;
        Ok(g.to_lr1_automaton().to_output().to_json()?)
    })())
}

#[wasm_bindgen]
pub fn lr1_table_to_json(grammar: &str) -> String {
    json_or_error((|| -> Result<String, Error> {
        let g = Grammar::parse(grammar)?;
        Ok(g.to_lr1_automaton().to_parsing_table().to_json()?)
    })())
}

#[cfg(test)]
mod parse_tests {
    use crate::error::GrammarError;

    #[test]
    fn simple_parse() {
        let g = crate::Grammar::parse("S -> a").unwrap();

        let s = g.get_symbol_index("S").unwrap();
        let a = g.get_symbol_index("a").unwrap();

        assert_eq!(g.get_symbol_name(s), "S");
        assert_eq!(g.get_symbol_name(a), "a");
        assert!(!g.is_nullable(s));

        assert_eq!(g.rules_of(s).next().unwrap().right, vec![a]);
    }

    #[test]
    fn simple_parse_with_space() {
        let g = crate::Grammar::parse("  S -> a ").unwrap();

        let s = g.get_symbol_index("S").unwrap();
        let a = g.get_symbol_index("a").unwrap();

        assert_eq!(g.get_symbol_name(s), "S");
        assert_eq!(g.rules_of(s).next().unwrap().right, vec![a]);
    }

    #[test]
    fn simple_parse_with_space_and_newline() {
        let g = crate::Grammar::parse("  S -> a \n | b c").unwrap();

        let s = g.get_symbol_index("S").unwrap();
        let a = g.get_symbol_index("a").unwrap();
        let b = g.get_symbol_index("b").unwrap();
        let c = g.get_symbol_index("c").unwrap();

        let rights: Vec<Vec<usize>> = g.rules_of(s).map(|r| r.right.clone()).collect();
        assert_eq!(rights, vec![vec![a], vec![b, c]]);
    }

    #[test]
    fn empty_parse() {
        assert_eq!(
            crate::Grammar::parse("  \n  ").unwrap_err(),
            GrammarError::Empty
        );
    }

    #[test]
    #[should_panic]
    fn two_rightarrows_parse() {
        let _g = crate::Grammar::parse("S -> a -> b").unwrap();
    }

    #[test]
    #[should_panic]
    fn no_left_parse() {
        let _g = crate::Grammar::parse("-> a").unwrap();
    }

    #[test]
    #[should_panic]
    fn no_previous_left_parse() {
        let _g = crate::Grammar::parse("| a b\n S -> a").unwrap();
    }

    #[test]
    #[should_panic]
    fn left_contain_space() {
        let _g = crate::Grammar::parse("S a S -> x").unwrap();
    }
}

#[cfg(test)]
mod json_tests {
    #[test]
    fn nff_json() {
        let _ = env_logger::try_init();
        let json = super::nullable_first_follow_to_json("S -> a S | ε");
        assert_eq!(
            json,
            r#"{"data":[{"name":"S","nullable":true,"first":["a","ε"],"follow":["$"]}]}"#
        );
    }

    #[test]
    fn errors_become_json_objects() {
        let json = super::nullable_first_follow_to_json("S -> a -> b");
        assert_eq!(json, r#"{"error":"grammar error: Line 1: too many \"->\""}"#);

        let json = super::earley_forest_to_json("S -> a", "b", false);
        assert!(json.starts_with(r#"{"error":"parse error: input rejected at position 0"#));
    }

    #[test]
    fn forest_json_has_root() {
        let json = super::earley_forest_to_json("S -> id S | ε", "id id", true);
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["root"], 0);
        assert_eq!(v["nodes"][0]["name"], "S");
        assert_eq!(v["nodes"][0]["kind"]["type"], "branch");
    }

    #[test]
    fn automaton_and_table_json() {
        let v: serde_json::Value =
            serde_json::from_str(&super::lr1_automaton_to_json("E -> E + E | n")).unwrap();
        assert!(!v["conflicts"].as_array().unwrap().is_empty());
        assert_eq!(v["conflicts"][0]["kind"]["type"], "shift_reduce");

        let v: serde_json::Value =
            serde_json::from_str(&super::lr1_table_to_json("S -> a")).unwrap();
        assert_eq!(v["terminals"], serde_json::json!(["a", "$"]));
    }
}
