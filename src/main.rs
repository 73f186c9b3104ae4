use asm24::assembler;
use asm24::logging;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <source-stem>...", args[0]);
        return;
    }

    // every stem gets a full attempt; a failed file never stops the run
    for stem in &args[1..] {
        if assembler::assemble(stem) {
            logging::success(stem);
        }
    }
}
