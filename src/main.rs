//! Interactive command-line front end: a menu of built-in example models,
//! file and typed-in input, and a terminal-backed [`Frontend`].

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing_subscriber::EnvFilter;

use linprog_tutor::bnb::BnbSolver;
use linprog_tutor::model::ModelParser;
use linprog_tutor::{report, Frontend, Model, Tableau};

#[derive(Parser)]
#[command(
    name = "linprog-tutor",
    version,
    about = "Walk through the two-phase simplex method over exact rationals"
)]
struct Args {
    /// Solve this model file directly instead of showing the menu.
    model: Option<PathBuf>,

    /// Run without prompts; pivots and branching are chosen automatically.
    #[arg(long)]
    auto: bool,
}

/// Terminal frontend: prints narration, reads prompts with line editing.
/// Ctrl+C or Ctrl+D abort the program, as promised by the banner.
struct Console {
    editor: DefaultEditor,
}

impl Console {
    fn new() -> rustyline::Result<Console> {
        Ok(Console {
            editor: DefaultEditor::new()?,
        })
    }
}

impl Frontend for Console {
    fn say(&mut self, text: &str) {
        println!("{}", text);
    }

    fn ask(&mut self, prompt: &str) -> String {
        match self.editor.readline(prompt) {
            Ok(line) => {
                let line = line.trim().to_string();
                if !line.is_empty() {
                    let _ = self.editor.add_history_entry(&line);
                }
                line
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                std::process::exit(0);
            }
            Err(_) => String::new(),
        }
    }
}

/// Prints everything but answers every prompt with the default.
struct Batch;

impl Frontend for Batch {
    fn say(&mut self, text: &str) {
        println!("{}", text);
    }
}

const EXAMPLES: [&str; 8] = [
    // 0: the first linear program (free variables make it unbounded)
    "max 6x + 4y + Z2 + Z1\n\
     st\n\
     6x + 8y  <= 12\n\
     10x+ 5y  <= 10\n\
     free: Z1, Z2 #test a free variable\n\
     end",
    // 1: one optimal solution
    "MIN 3X1 +5/2X2 +7/2X3 -4X4 +1X5\n\
     SUCH THAT\n\
     -1X1   +3X2   +5X3        +1X5 = 12\n\
     +1X2   +3X3  +2X4  +3X5 = 10\n\
     2X1   -1X2               +4X5 = 20\n\
     END",
    // 2: multiple optimal solutions
    "MIN 10/7X1 +7/2X2          -4X4 +1X5\n\
     SUBJECT    To\n\
     +2X2     -1X3    +3X4  +2X5 =   10\n\
     2X1                    -4X4  +3X5 =   12\n\
     -1X2     +1X3          +1X5 =   15\n\
     END",
    // 3: infeasible problem
    "MIN X1 +3/2X2 +2X3 -3/2X4\n\
     S.T.\n\
     4X1            -1X3  +3X4 =     8\n\
     2X1      -3X2        -4X4 =    21\n\
     -1X2  +3X3       =    15\n\
     end",
    // 4: infinite solution
    "MIN 3X1 +7/2X2       -4X4 + X5\n\
     ST\n\
     +3X2  -2X3    +3X4   +3X5 =  10\n\
     2X1                  -4X4   +5X5 =  20\n\
     -X2                 +X5 =  15\n\
     end",
    // 5: cycling example from Beale
    "max 3/4X1 -150X2 +1/50X3 -6X4\n\
     st\n\
     1/4X1 -60X2 -1/25X3 + 9X4 < 0\n\
     1/2X1 -90X2 -1/50X3 + 3X4 < 0\n\
     end",
    // 6: cycling example from Marshall and Suurballe
    "MIN  -.4 X1 - .4 X2 + 1.8 X3\n\
     ST\n\
     1) .6 x1 - 6.4 x2 + 4.8 x3 < 0\n\
     2) .2 x1 - 1.8 x2 +  .6 x3 < 0\n\
     3) .4 x1 - 1.6 x2 +  .2 x3 < 0\n\
     END",
    // 7: branch and bound
    "max 100 x1 + 150 x2\n\
     st\n\
     8000 x1 + 4000x2 <= 40000\n\
     15 x1 + 30 x2 <= 200\n\
     int: x1, x2\n\
     end",
];

const MENU: &str = "\n              ***  Menu  ***\n\
                   \u{20}       ============================\n\
                   \u{20}       0  The first linear program\n\
                   \u{20}       1  One optimal solution\n\
                   \u{20}       2  Multiple optimal solution\n\
                   \u{20}       3  Infeasible problem\n\
                   \u{20}       4  Infinite solution\n\
                   \u{20}       5  Cycling example (Beale)\n\
                   \u{20}       6  Marshall and Suurballe\n\
                   \u{20}       7  Branch and Bound example\n\
                   \u{20}       8  Define a linear program\n\n\
                   Your choice (hit 'return' to quit) [0-8]:";

const INPUT_FORMAT: &str = "\n                        Input Format\n\
    ==========================================================\n\n\
    Comments start with '#' and continue to the end of line.\n\
    Integers, decimals and fractions are acceptable numbers.\n\
    Everything in the input is case INsensitive.\n\n\
    The first non-comment line must be the objective (min/max):\n\
    \u{20}  min 5x + 0.1 y - z    # this is the objective\n\
    The next line must be one of 'st', 's.t.', 'subject to',\n\
    and 'such that', indicating the start of constraints.\n\
    Then each line afterwards gives a plain constraint like:\n\
    \u{20}  3 x + 4 y + 1/2 z < 100 # use '=', '<', '>', '<=', '>='.\n\
    A plain constraint can optionally have a name:\n\
    \u{20}  labor) 3 x + 4 y + z < 100 # label will appear in report\n\
    A special constraint begins with 'free:', 'int:', or 'bin:',\n\
    followed by a list of variables of the indicated kind:\n\
    \u{20}  free: x, y # x, y are free. int: integral, bin: binary\n\
    A variable is non-negative and continuous by default.\n\
    The last line should be \"end\" to indicate the end of model.\n\n\
    File name [to type in a model here, hit return]:";

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();
    let interactive = !args.auto;

    if let Some(path) = &args.model {
        let mut ui: Box<dyn Frontend> = frontend(interactive);
        return match fs::read_to_string(path) {
            Ok(text) => match Model::parse(&text) {
                Ok(model) => {
                    run_model(model, interactive, ui.as_mut());
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("{}: {}", path.display(), e);
                    ExitCode::FAILURE
                }
            },
            Err(e) => {
                eprintln!("{}: {}", path.display(), e);
                ExitCode::FAILURE
            }
        };
    }

    let mut ui = frontend(interactive);
    ui.say("\nWelcome to simplex tableaux!\nTo abort ANYTIME, use \"ctrl+C\".\n");
    menu_loop(interactive, ui.as_mut());
    ExitCode::SUCCESS
}

fn frontend(interactive: bool) -> Box<dyn Frontend> {
    if !interactive {
        return Box::new(Batch);
    }
    match Console::new() {
        Ok(console) => Box::new(console),
        Err(_) => Box::new(Batch),
    }
}

fn menu_loop(interactive: bool, ui: &mut dyn Frontend) {
    loop {
        let choice = ui.ask(MENU);
        match choice.as_str() {
            "" => break,
            "8" => define_model(interactive, ui),
            c if c.len() == 1 && c.chars().all(|ch| ('0'..='7').contains(&ch)) => {
                let model_text = EXAMPLES[c.parse::<usize>().expect("single digit")];
                match Model::parse(model_text) {
                    Ok(model) => {
                        ui.say(&format!("The parsed model is:\n{}", model));
                        ui.ask(
                            "Hint: You may save the replay to a file later.\n\
                             Hit 'enter/return' to continue...",
                        );
                        run_model(model, interactive, ui);
                    }
                    Err(e) => ui.say(&format!("{}", e)),
                }
            }
            _ => break,
        }
    }
}

/// Option 8: read a model from a file, or let the user type one in line by
/// line with parse errors reported and the offending line discarded.
fn define_model(interactive: bool, ui: &mut dyn Frontend) {
    let answer = ui.ask(INPUT_FORMAT);
    if !answer.is_empty() {
        match fs::read_to_string(&answer) {
            Ok(text) => match Model::parse(&text) {
                Ok(model) => {
                    ui.say(&format!("The parsed model is:\n{}", model));
                    ui.ask("hit 'return' to continue...");
                    run_model(model, interactive, ui);
                }
                Err(e) => ui.say(&format!("{}", e)),
            },
            Err(e) => ui.say(&format!("{}: {}", answer, e)),
        }
        return;
    }

    ui.say("Type your model, end with a line of just 'END'.");
    let mut parser = ModelParser::new();
    loop {
        let line = ui.ask("");
        match parser.feed(&line) {
            Ok(true) => break,
            Ok(false) => {}
            Err(e) => ui.say(&format!("{}", e)),
        }
    }
    match parser.finish() {
        Ok(model) => {
            ui.say(&format!("The parsed model is:\n{}", model));
            ui.ask("hit 'return' to continue...");
            run_model(model, interactive, ui);
        }
        Err(e) => ui.say(&format!("{}", e)),
    }
}

fn run_model(model: Model, interactive: bool, ui: &mut dyn Frontend) {
    if model.is_integer_program() {
        match BnbSolver::new(model, interactive, ui) {
            Ok(mut solver) => {
                if let Err(e) = solver.solve(ui) {
                    ui.say(&format!("{}", e));
                }
            }
            Err(e) => ui.say(&format!("{}", e)),
        }
        return;
    }
    let mut tab = Tableau::new(&model, interactive);
    match tab.solve(-1, ui) {
        Ok(_) => report::report(&mut tab, ui),
        Err(e) => ui.say(&format!("{}", e)),
    }
}
