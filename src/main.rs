use log::debug;

use minsh::shell::Shell;
use minsh::utils::config::Config;
use minsh::utils::log::init_logger;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::new();
    init_logger(&config);
    debug!("配置加载成功");

    let mut shell = Shell::new(&config);
    shell.run()
}
