use assert_cmd::Command;
use insta_cmd::get_cargo_bin;

pub fn mdxp_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("mdxp"));
	cmd.env("NO_COLOR", "1");
	cmd.env_remove("MDXP_LOG");
	cmd
}
