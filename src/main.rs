use std::{fs, io::BufRead};

use grammar_kit::{
    CharScanner, EarleyParser, Error, Grammar, Scanner, UngerParser, WordScanner,
};

const OUTPUTS: [&str; 8] = [
    "prod", "nff", "earley", "trees", "unger", "lr1fsm", "lr1table", "lr1parse",
];

/// Derivations printed by `trees` at most.
const TREE_LIMIT: usize = 16;

fn print_help() {
    println!("Usage: grammar-kit outputs [options] [grammar file]");
    println!("outputs:");
    println!("  prod: Productions");
    println!("  nff: Nullable first and follow");
    println!("  earley: Earley parse forest of the input");
    println!("  trees: Derivation trees of the input (Earley)");
    println!("  unger: Unger parse tree of the input");
    println!("  lr1fsm: LR(1) Automata");
    println!("  lr1table: LR(1) parsing table");
    println!("  lr1parse: LR(1) parse tree of the input");
    println!("options:");
    println!("  -h: Print this help");
    println!("  -l: Print in LaTeX format");
    println!("  -j: Print in JSON format");
    println!("  -w: Split the input on whitespace instead of per character");
    println!("  -i <input>: Input string for earley, trees, unger and lr1parse");
    println!("environment:");
    println!("  RUST_LOG: log level (error, warn, info, debug, trace)");
}

enum OutputFormat {
    Plain,
    LaTeX,
    JSON,
}

struct Options {
    outputs: Vec<String>,
    format: OutputFormat,
    words: bool,
    input: String,
    grammar_file: Option<String>,
}

/// `None` when the help text should be printed instead of running.
fn parse_args(args: &[String]) -> Option<Options> {
    let mut i: usize = 0;
    let mut outputs = Vec::new();
    while i < args.len() && OUTPUTS.contains(&args[i].as_str()) {
        outputs.push(args[i].clone());
        i += 1;
    }

    let mut format = OutputFormat::Plain;
    let mut words = false;
    let mut input = String::new();
    while i < args.len() && args[i].starts_with('-') {
        match args[i].as_str() {
            "-h" | "--help" => return None,
            "-l" => format = OutputFormat::LaTeX,
            "-j" => format = OutputFormat::JSON,
            "-w" => words = true,
            "-i" => {
                i += 1;
                input = args.get(i)?.clone();
            }
            _ => return None,
        }
        i += 1;
    }

    if i + 1 < args.len() || outputs.is_empty() {
        return None;
    }

    Some(Options {
        outputs,
        format,
        words,
        input,
        grammar_file: args.get(i).cloned(),
    })
}

fn read_grammar(file: Option<&str>) -> Result<String, Error> {
    match file {
        Some(path) => Ok(fs::read_to_string(path)?),
        None => Ok(std::io::stdin()
            .lock()
            .lines()
            .collect::<Result<Vec<String>, _>>()?
            .join("\n")),
    }
}

fn scanner<'a>(options: &'a Options) -> Box<dyn Scanner + 'a> {
    if options.words {
        Box::new(WordScanner::new(&options.input))
    } else {
        Box::new(CharScanner::new(&options.input))
    }
}

fn run(options: &Options) -> Result<(), Error> {
    let g = Grammar::parse(&read_grammar(options.grammar_file.as_deref())?)?;

    for output in &options.outputs {
        let text = match output.as_str() {
            "prod" => {
                let t = g.to_production_output_vec();
                match options.format {
                    OutputFormat::Plain => t.to_plaintext(),
                    OutputFormat::LaTeX => t.to_latex(),
                    OutputFormat::JSON => t.to_json()?,
                }
            }
            "nff" => {
                let t = g.to_non_terminal_output_vec();
                match options.format {
                    OutputFormat::Plain => t.to_plaintext(),
                    OutputFormat::LaTeX => t.to_latex(),
                    OutputFormat::JSON => t.to_json()?,
                }
            }
            "earley" => {
                let t = EarleyParser::new(&g).parse(scanner(options))?;
                match options.format {
                    OutputFormat::JSON => t.to_json()?,
                    _ => t.to_plaintext(),
                }
            }
            "trees" => {
                let trees = EarleyParser::new(&g)
                    .parse(scanner(options))?
                    .trees(TREE_LIMIT);
                match options.format {
                    OutputFormat::JSON => serde_json::to_string(&trees)?,
                    _ => trees
                        .iter()
                        .map(|t| t.to_string())
                        .collect::<Vec<_>>()
                        .join("\n"),
                }
            }
            "unger" => {
                let t = UngerParser::new(&g).parse(scanner(options))?;
                match options.format {
                    OutputFormat::JSON => t.to_json()?,
                    _ => t.to_string(),
                }
            }
            "lr1fsm" => {
                let t = g.to_lr1_automaton();
                match options.format {
                    OutputFormat::Plain => t.to_plaintext(),
                    OutputFormat::LaTeX => t.to_latex(),
                    OutputFormat::JSON => t.to_output().to_json()?,
                }
            }
            "lr1table" => {
                let t = g.to_lr1_automaton().to_parsing_table();
                match options.format {
                    OutputFormat::Plain => t.to_plaintext(),
                    OutputFormat::LaTeX => t.to_latex(),
                    OutputFormat::JSON => t.to_json()?,
                }
            }
            "lr1parse" => {
                let t = g.to_lr1_automaton().parse(scanner(options))?;
                match options.format {
                    OutputFormat::JSON => t.to_json()?,
                    _ => t.to_string(),
                }
            }
            _ => continue,
        };
        println!("{}", text);
    }
    Ok(())
}

fn main() {
    env_logger::init();

    let args = std::env::args().skip(1).collect::<Vec<String>>();
    let options = match parse_args(&args) {
        Some(options) => options,
        None => {
            print_help();
            return;
        }
    };

    if let Err(e) = run(&options) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
