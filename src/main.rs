use threadview::app::{self, Command};

fn main() {
    let command = match app::parse_args(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(2);
        }
    };

    match command {
        Command::Version => println!("threadview {}", threadview::VERSION),
        Command::Help => println!("{}", app::HELP),
        Command::Run(options) => {
            if let Err(err) = threadview::run(options) {
                eprintln!("error: {err:?}");
                std::process::exit(1);
            }
        }
    }
}
