// Gridlet CLI - headless spreadsheet operations

use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use gridlet_engine::cell::format_number;
use gridlet_engine::formula::eval::{Evaluator, Value};
use gridlet_engine::formula::refs::{format_a1, CellRef};
use gridlet_engine::formula::rewrite::shift_formula_refs;
use gridlet_engine::grid::Grid;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_EVAL_ERROR: u8 = 1;
pub const EXIT_USAGE: u8 = 2;
pub const EXIT_IO_ERROR: u8 = 3;

#[derive(Parser)]
#[command(name = "gridlet")]
#[command(about = "Small spreadsheet core (CLI mode, headless)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a spreadsheet formula against delimited data
    #[command(after_help = "\
Examples:
  cat data.csv | gridlet calc '=SUM(A1:C1)'
  gridlet calc '=AVERAGE(A1:A10)' data.csv
  gridlet calc '=MAX(A1:B2)' data.tsv -d $'\\t'")]
    Calc {
        /// Formula to evaluate (must start with =)
        formula: String,

        /// Input file (omit to read from stdin)
        input: Option<PathBuf>,

        /// Field delimiter
        #[arg(long, short = 'd', default_value = ",")]
        delimiter: char,
    },

    /// Print the fully evaluated grid
    #[command(after_help = "\
Examples:
  gridlet show data.csv
  cat data.csv | gridlet show --json")]
    Show {
        /// Input file (omit to read from stdin)
        input: Option<PathBuf>,

        /// Field delimiter
        #[arg(long, short = 'd', default_value = ",")]
        delimiter: char,

        /// Emit a JSON array of rows instead of tab-separated text
        #[arg(long)]
        json: bool,
    },

    /// Shift cell references in a formula body by a row/column delta
    #[command(after_help = "\
Examples:
  gridlet shift 'A1+$B$2' 1 1")]
    Shift {
        /// Formula body (without the leading =)
        body: String,

        /// Row delta
        rows: i64,

        /// Column delta
        cols: i64,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Calc { formula, input, delimiter } => cmd_calc(&formula, input, delimiter),
        Commands::Show { input, delimiter, json } => cmd_show(input, delimiter, json),
        Commands::Shift { body, rows, cols } => {
            println!("{}", shift_formula_refs(&body, rows, cols));
            EXIT_SUCCESS
        }
    };
    ExitCode::from(code)
}

fn cmd_calc(formula: &str, input: Option<PathBuf>, delimiter: char) -> u8 {
    let Some(body) = formula.strip_prefix('=') else {
        eprintln!("error: formula must start with =");
        return EXIT_USAGE;
    };

    let grid = match load_grid(input, delimiter) {
        Ok(grid) => grid,
        Err(code) => return code,
    };

    match Evaluator::new(&grid).eval_body(body) {
        Ok(Value::Number(n)) => {
            println!("{}", format_number(n));
            EXIT_SUCCESS
        }
        Ok(Value::Error(code)) => {
            println!("{}", code.as_str());
            EXIT_SUCCESS
        }
        // eval_body rejects a range at the root, so lists cannot appear
        Ok(Value::List(_)) => {
            eprintln!("error: Invalid range in expression");
            EXIT_EVAL_ERROR
        }
        Err(message) => {
            eprintln!("error: {}", message);
            EXIT_EVAL_ERROR
        }
    }
}

fn cmd_show(input: Option<PathBuf>, delimiter: char, json: bool) -> u8 {
    let mut grid = match load_grid(input, delimiter) {
        Ok(grid) => grid,
        Err(code) => return code,
    };

    let mut rows: Vec<Vec<String>> = vec![Vec::with_capacity(grid.cols()); grid.rows()];
    grid.for_each_display(None, |row, _, text| {
        rows[row].push(text.to_string());
    });

    if json {
        match serde_json::to_string(&rows) {
            Ok(out) => println!("{}", out),
            Err(err) => {
                eprintln!("error: {}", err);
                return EXIT_IO_ERROR;
            }
        }
    } else {
        for row in &rows {
            println!("{}", row.join("\t"));
        }
    }

    for ((row, col), message) in grid.errors() {
        eprintln!(
            "warning: {}: {}",
            format_a1(&CellRef::new(row, col)),
            message
        );
    }
    EXIT_SUCCESS
}

/// Read delimited rows from a file or stdin into a grid.
fn load_grid(input: Option<PathBuf>, delimiter: char) -> Result<Grid, u8> {
    if !delimiter.is_ascii() {
        eprintln!("error: delimiter must be a single ASCII character");
        return Err(EXIT_USAGE);
    }

    let reader: Box<dyn Read> = match input {
        Some(path) => match File::open(&path) {
            Ok(file) => Box::new(file),
            Err(err) => {
                eprintln!("error: {}: {}", path.display(), err);
                return Err(EXIT_IO_ERROR);
            }
        },
        None => Box::new(io::stdin()),
    };

    match read_matrix(reader, delimiter as u8) {
        Ok(matrix) => Ok(Grid::load_from_matrix(matrix)),
        Err(err) => {
            eprintln!("error: {}", err);
            Err(EXIT_IO_ERROR)
        }
    }
}

fn read_matrix(reader: impl Read, delimiter: u8) -> Result<Vec<Vec<String>>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut matrix = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        matrix.push(record.iter().map(str::to_string).collect());
    }
    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_matrix_csv() {
        let matrix = read_matrix("1,2,3\n4,5,6\n".as_bytes(), b',').unwrap();
        assert_eq!(
            matrix,
            vec![
                vec!["1".to_string(), "2".to_string(), "3".to_string()],
                vec!["4".to_string(), "5".to_string(), "6".to_string()],
            ]
        );
    }

    #[test]
    fn test_read_matrix_ragged_rows() {
        let matrix = read_matrix("a\tb\tc\nd\n".as_bytes(), b'\t').unwrap();
        assert_eq!(matrix[0].len(), 3);
        assert_eq!(matrix[1].len(), 1);
        // Grid pads the short rows
        let grid = Grid::load_from_matrix(matrix);
        assert_eq!(grid.cols(), 3);
    }

    #[test]
    fn test_calc_formula_over_matrix() {
        let matrix = read_matrix("1,2\n3,4\n".as_bytes(), b',').unwrap();
        let grid = Grid::load_from_matrix(matrix);
        let value = Evaluator::new(&grid).eval_body("SUM(A1:B2)").unwrap();
        assert!(matches!(value, Value::Number(n) if n == 10.0));
    }
}
