use std::process;

use structopt::StructOpt;

use muljit_core::{CompileError, CompiledFunction, Program};

#[derive(Debug, StructOpt)]
#[structopt(
    name = "muljit",
    about = "Generates machine code for a few tiny integer functions at run time and checks their answers."
)]
struct Opt {
    /// Constant baked into the generated multiply function.
    #[structopt(name = "MULTIPLIER", default_value = "2", allow_hyphen_values = true)]
    multiplier: i32,
}

fn main() {
    let opt = Opt::from_args();

    println!("pagesize {}", jitmem::page_size());

    let programs = [
        Program::ReturnConstant(123),
        Program::ReturnArgument,
        Program::Negate,
        Program::Double,
        Program::MultiplyBy(opt.multiplier),
    ];

    let mut all_ok = true;
    for program in programs {
        match check(program) {
            Ok(ok) => all_ok &= ok,
            Err(err) => {
                // Platform failures are fatal; there is nothing to retry.
                eprintln!("muljit: {:?}", err);
                process::exit(1);
            }
        }
    }

    if !all_ok {
        process::exit(1);
    }
    println!("done");
}

/// Compile one program, call it across a range of arguments, and compare
/// every answer against [Program::evaluate].
fn check(program: Program) -> Result<bool, CompileError> {
    println!("compiling {:?}", program);
    let function = CompiledFunction::compile(program)?;

    print!("  code:");
    for byte in function.code() {
        print!(" {:02x}", byte);
    }
    println!();

    let mut ok = true;
    for x in 0..10 {
        let expected = program.evaluate(x);
        let actual = function.call(x);
        let good = actual == expected;
        ok &= good;
        println!(
            "  {:4} call({}) = {}",
            if good { "OK" } else { "FAIL" },
            x,
            actual
        );
    }

    function.release()?;
    Ok(ok)
}
