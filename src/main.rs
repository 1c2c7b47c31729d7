use op2_reader::{MatrixHeader, Op2Reader, ReaderOptions, TableOutput};
use std::env;
use std::fs::File;
use std::io::BufReader;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!(
            "Usage: {} <file.op2> [--matrices <A,B,...>] [--debug-trace <out.txt>] [--lenient-header]",
            args[0]
        );
        std::process::exit(1);
    }

    let op2_path = &args[1];
    let mut options = ReaderOptions::new();

    // Parse --matrices argument
    if let Some(idx) = args.iter().position(|arg| arg == "--matrices") {
        match args.get(idx + 1) {
            Some(names) => {
                options = options.with_additional_matrices(names.split(','));
            }
            None => {
                eprintln!("ERROR: --matrices flag requires a comma-separated list of names.");
                std::process::exit(1);
            }
        }
    }
    if let Some(idx) = args.iter().position(|arg| arg == "--debug-trace") {
        match args.get(idx + 1) {
            Some(path) => {
                options = options.with_debug_file(path);
            }
            None => {
                eprintln!("ERROR: --debug-trace flag requires an output path.");
                std::process::exit(1);
            }
        }
    }
    if args.iter().any(|arg| arg == "--lenient-header") {
        options = options.with_strict_header(false);
    }

    println!("Reading OP2 file: {}", op2_path);
    if !options.additional_matrices.is_empty() {
        println!("Additional matrices: {:?}", options.additional_matrices);
    }
    println!("{}", "=".repeat(60));

    let file = match File::open(op2_path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("\nERROR: Cannot open {}", op2_path);
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    };

    let mut reader: Op2Reader = Op2Reader::new(options);
    let mut scan = match reader.tables(BufReader::new(file)) {
        Ok(scan) => scan,
        Err(e) => {
            eprintln!("\nERROR: Failed to read OP2 file");
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    };

    if let Some(header) = scan.session().header() {
        println!("\nFile Header:");
        println!("  Date: {}", header.date);
        println!("  Tape code: {}", header.tape_code);
        println!("  Label: {}", header.label);
    }
    println!("  Byte order: {}", scan.session().endian());

    println!("\nTables:");
    let mut count = 0usize;
    let mut matrices: Vec<(String, MatrixHeader, usize)> = Vec::new();
    for event in scan.by_ref() {
        match event {
            Ok(event) => {
                count += 1;
                println!("  {:>3}. {:<10} @ {:>10}  {}", count, event.name.as_str(), event.offset, event.kind);
                if let TableOutput::Matrix(matrix) = event.output {
                    matrices.push((matrix.name.as_str().to_string(), matrix.header, matrix.columns.len()));
                }
            }
            Err(e) => {
                eprintln!("\nERROR: Failed to read OP2 file");
                eprintln!("  {}", e);
                std::process::exit(1);
            }
        }
    }

    println!("\n{}", "=".repeat(60));
    println!("SUCCESS! Reading completed.");
    println!("{}", "=".repeat(60));

    println!("\nStatistics:");
    println!("  Tables: {}", scan.session().audit_trail().len());
    println!("  End offset: {}", scan.session().tell());

    if !matrices.is_empty() {
        println!("\nMatrices:");
        for (name, header, columns) in &matrices {
            println!("  {}: {} ({} column(s) read)", name, header, columns);
        }
    }
}
