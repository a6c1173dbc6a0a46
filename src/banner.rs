// Banner and version text, written to stderr so piped output stays clean

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const BANNER: &str = r"
                                     __
    ____  _   __ _____ ___   ____   / /____ _ _____ ___
   / __ \| | / // ___// _ \ / __ \ / // __  // ___// _ \
  / /_/ /| |/ // /   /  __// /_/ // // /_/ // /__ /  __/
 / .___/ |___//_/    \___// .___//_/ \__,_/ \___/ \___/
/_/                      /_/
";

pub fn banner() -> String {
    format!("{}\n{:>55}\n", BANNER, format!("Current pvreplace version v{}", VERSION))
}

pub fn print_banner() {
    eprintln!("{}", banner());
}
