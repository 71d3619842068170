/// dexsimplify - classify and prepare Dalvik instruction listings
use dexsimplify::{
    parse_methods, prepare_methods, Dispatch, MethodBody, OpHandlerFactory, PreparedMethod,
    SimplifyConfig, VmContext,
};
use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::process;
use std::sync::Arc;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_usage() {
    eprintln!("dexsimplify v{}", VERSION);
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("    dexsimplify [OPTIONS] <LISTING>");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("    -h, --help               Print this help message");
    eprintln!("    -v, --version            Print version information");
    eprintln!("    -c, --config <FILE>      Read settings from a TOML file");
    eprintln!("    -m, --method <DESC>      Only this method, or the name of a plain listing");
    eprintln!("    --fold-constants         Route const instructions to the constant handler");
    eprintln!("    --execute                Fold straight-line code and print the final registers");
    eprintln!("                             (implies --fold-constants)");
    eprintln!("    --trace                  Log every dispatch to stderr");
    eprintln!();
    eprintln!("ARGUMENTS:");
    eprintln!("    <LISTING>                Smali-style listing (use '-' for stdin)");
    eprintln!();
    eprintln!("EXAMPLES:");
    eprintln!("    dexsimplify Foo.smali");
    eprintln!("    dexsimplify --execute --method 'LFoo;->bar()I' Foo.smali");
    eprintln!("    echo 'add-int v0, v1, v2' | dexsimplify -");
}

fn print_version() {
    println!("dexsimplify {}", VERSION);
}

struct Options {
    input: Option<String>,
    config: Option<String>,
    method: Option<String>,
    fold_constants: bool,
    execute: bool,
    trace: bool,
}

fn parse_args() -> Result<Options, String> {
    let args: Vec<String> = env::args().collect();

    let mut options = Options {
        input: None,
        config: None,
        method: None,
        fold_constants: false,
        execute: false,
        trace: false,
    };
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage();
                process::exit(0);
            }
            "-v" | "--version" => {
                print_version();
                process::exit(0);
            }
            "-c" | "--config" => {
                i += 1;
                let path = args.get(i).ok_or("Missing file after --config")?;
                options.config = Some(path.clone());
            }
            "-m" | "--method" => {
                i += 1;
                let method = args.get(i).ok_or("Missing descriptor after --method")?;
                options.method = Some(method.clone());
            }
            "--fold-constants" => options.fold_constants = true,
            "--execute" => options.execute = true,
            "--trace" => options.trace = true,
            arg if arg.starts_with('-') && arg != "-" => {
                return Err(format!("Unknown option: {}", arg));
            }
            arg => {
                if options.input.is_some() {
                    return Err("Multiple listings specified".to_string());
                }
                options.input = Some(arg.to_string());
            }
        }
        i += 1;
    }

    Ok(options)
}

fn read_input(input: &str) -> Result<String, String> {
    if input == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| format!("Failed to read from stdin: {}", e))?;
        Ok(buffer)
    } else {
        let path = Path::new(input);
        if !path.exists() {
            return Err(format!("Listing not found: {}", input));
        }
        fs::read_to_string(path).map_err(|e| format!("Failed to read file '{}': {}", input, e))
    }
}

fn load_config(options: &Options) -> Result<SimplifyConfig, String> {
    let config = match &options.config {
        Some(path) => SimplifyConfig::load(path).map_err(|e| e.to_string())?,
        None => SimplifyConfig::default(),
    };
    let mut config = config.with_env_overrides();
    if options.fold_constants || options.execute {
        config = config.with_constant_folding();
    }
    Ok(if options.trace { config.with_trace() } else { config })
}

fn init_logging(trace: bool) {
    let level = if trace {
        tracing::Level::TRACE
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

fn outcome(dispatch: &Dispatch) -> (String, &'static str) {
    match dispatch {
        Dispatch::Handler(handler) if handler.is_unimplemented() => {
            (handler.category().to_string(), "fallback")
        }
        Dispatch::Handler(handler) => (handler.category().to_string(), "handler"),
        Dispatch::NotWired { category, .. } => (category.to_string(), "not wired"),
    }
}

fn format_method(prepared: &PreparedMethod) -> String {
    let mut output = format!("method {}\n", prepared.method());
    for (index, dispatch) in prepared.ops().iter().enumerate() {
        let (category, result) = outcome(dispatch);
        let mnemonic = match dispatch {
            Dispatch::Handler(handler) => handler.instruction().opcode().mnemonic(),
            Dispatch::NotWired { opcode, .. } => opcode.mnemonic(),
        };
        output.push_str(&format!(
            "{:>5}  {:<26} {:<20} {}\n",
            index, mnemonic, category, result
        ));
    }
    for diagnostic in prepared.diagnostics() {
        output.push_str(&format!("  note: {}\n", diagnostic));
    }
    output
}

/// Fold a prepared method and format the registers it leaves known
fn execute_method(
    ctx: &VmContext,
    body: &MethodBody,
    prepared: &PreparedMethod,
) -> Result<String, String> {
    let mut state = ctx
        .new_state(body.register_count())
        .map_err(|e| format!("{}: {}", body.descriptor, e))?;
    let run = prepared
        .execute_straight_line(&mut state)
        .map_err(|e| format!("{}: execution failed: {}", body.descriptor, e))?;

    let mut output = String::new();
    if let Some(index) = run.stopped_at {
        output.push_str(&format!("  stopped at index {}\n", index));
    }
    for (reg, value) in state.registers().iter().enumerate() {
        if value.is_known() {
            output.push_str(&format!("  v{} = {}\n", reg, value));
        }
    }
    Ok(output)
}

fn run(options: &Options, input: &str) -> Result<String, String> {
    let config = load_config(options)?;
    init_logging(config.trace);

    let mut bodies = parse_methods(input).map_err(|e| format!("Parse error: {}", e))?;
    match &options.method {
        Some(method) if bodies.len() == 1 && bodies[0].descriptor.is_empty() => {
            bodies[0].descriptor = method.clone();
        }
        Some(method) => {
            bodies.retain(|body| &body.descriptor == method);
            if bodies.is_empty() {
                return Err(format!("Method not found: {}", method));
            }
        }
        None => {
            for body in bodies.iter_mut().filter(|b| b.descriptor.is_empty()) {
                body.descriptor = "<listing>".to_string();
            }
        }
    }

    let ctx = VmContext::new("", Arc::new(config));
    let factory = OpHandlerFactory::new();
    let results = prepare_methods(&factory, &ctx, &bodies);

    let mut output = String::new();
    let mut failed = Vec::new();
    for (body, result) in bodies.iter().zip(results) {
        let prepared = match result {
            Ok(prepared) => prepared,
            Err(e) => {
                failed.push(e.to_string());
                continue;
            }
        };
        output.push_str(&format_method(&prepared));

        if options.execute {
            match execute_method(&ctx, body, &prepared) {
                Ok(registers) => output.push_str(&registers),
                Err(e) => failed.push(e),
            }
        }
    }

    if failed.is_empty() {
        Ok(output)
    } else {
        print!("{}", output);
        Err(failed.join("\nError: "))
    }
}

fn main() {
    let options = match parse_args() {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            print_usage();
            process::exit(1);
        }
    };

    let input = match options.input.as_deref() {
        Some(input) => input,
        None => {
            eprintln!("Error: Missing listing");
            eprintln!();
            print_usage();
            process::exit(1);
        }
    };

    let content = match read_input(input) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    match run(&options, &content) {
        Ok(output) => print!("{}", output),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
