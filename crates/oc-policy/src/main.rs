use anyhow::{Result, anyhow};

use command::modify_roles::{Operation, SubjectType};
use config::Config;

mod cli;
mod command;
mod config;
mod io;
mod tracing_setup;

fn main() -> Result<()> {
    let matches = cli::build_cli().get_matches();
    let config = Config::from_args(&matches);
    tracing_setup::setup_tracing(&config.log_level, &config.log_fmt, config.log_no_color)?;

    match matches.subcommand() {
        Some(("convert", matches)) => command::convert::run(matches),
        Some(("reconcile-cluster-roles", matches)) => command::reconcile::cluster_roles(matches),
        Some(("reconcile-cluster-role-bindings", matches)) => {
            command::reconcile::cluster_role_bindings(matches)
        }
        Some(("reconcile-sccs", matches)) => command::reconcile::sccs(matches),
        Some(("add-role-to-user", matches)) => {
            command::modify_roles::run(matches, Operation::Add, SubjectType::User)
        }
        Some(("remove-role-from-user", matches)) => {
            command::modify_roles::run(matches, Operation::Remove, SubjectType::User)
        }
        Some(("add-role-to-group", matches)) => {
            command::modify_roles::run(matches, Operation::Add, SubjectType::Group)
        }
        Some(("remove-role-from-group", matches)) => {
            command::modify_roles::run(matches, Operation::Remove, SubjectType::Group)
        }
        Some(("who-can", matches)) => command::review::who_can(matches, &config),
        Some(("can-i", matches)) => command::review::can_i(matches, &config),
        Some((command, _)) => Err(anyhow!("unknown subcommand: {}", command)),
        None => {
            // NOTE: this should not happen due to
            // subcommand_required setting
            unreachable!();
        }
    }
}
