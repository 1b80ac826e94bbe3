use clap::builder::PossibleValue;
use clap::{
    Arg, ArgAction, Command, builder::PossibleValuesParser, crate_authors, crate_description,
    crate_name, crate_version,
};
use itertools::Itertools;
use lazy_static::lazy_static;
use origin_authorization::ResourceGroups;
use origin_authorization::constants::DEFAULT_MASTER_NAMESPACE;

lazy_static! {
    static ref VERSION_AND_RESOURCE_GROUPS: String = {
        let groups = ResourceGroups::new();
        let group_names: String = groups
            .group_names()
            .map(|group| format!("  - {group}"))
            .join("\n");

        format!(
            "{}\n\nKnown resource groups:\n{}",
            crate_version!(),
            group_names,
        )
    };
}

fn file_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .value_name("FILE")
        .required(true)
        .help(help)
}

fn reconcile_args() -> Vec<Arg> {
    vec![
        file_arg(
            "expected",
            "YAML file holding the recommended objects, one per document",
        ),
        file_arg(
            "actual",
            "YAML file holding the objects found in the cluster, one per document",
        ),
        Arg::new("additive-only")
            .long("additive-only")
            .action(ArgAction::SetTrue)
            .help("Preserve modified objects: keep extra rules and subjects instead of replacing them"),
    ]
}

fn subcommand_convert() -> Command {
    Command::new("convert")
        .about("Converts legacy authorization objects to RBAC and back")
        .arg(
            Arg::new("to")
                .long("to")
                .value_name("FAMILY")
                .required(true)
                .value_parser(PossibleValuesParser::new(["rbac", "origin"]))
                .help("Object family to convert to"),
        )
        .arg(file_arg("file", "YAML file holding the objects to convert"))
        .arg(
            Arg::new("namespace")
                .long("namespace")
                .short('n')
                .value_name("NAMESPACE")
                .help("Namespace of RBAC role bindings that do not carry one"),
        )
}

fn subcommand_reconcile_cluster_roles() -> Command {
    Command::new("reconcile-cluster-roles")
        .about("Computes the cluster roles to create or update to match the recommended ones")
        .args(reconcile_args())
}

fn subcommand_reconcile_cluster_role_bindings() -> Command {
    Command::new("reconcile-cluster-role-bindings")
        .about("Computes the cluster role bindings to create, update or recreate to match the recommended ones")
        .args(reconcile_args())
        .arg(
            Arg::new("exclude-user")
                .long("exclude-user")
                .action(ArgAction::Append)
                .number_of_values(1)
                .value_name("USER")
                .help("User that must not be added to any binding. Can be repeated multiple times"),
        )
        .arg(
            Arg::new("exclude-group")
                .long("exclude-group")
                .action(ArgAction::Append)
                .number_of_values(1)
                .value_name("GROUP")
                .help("Group that must not be added to any binding. Can be repeated multiple times"),
        )
}

fn subcommand_reconcile_sccs() -> Command {
    Command::new("reconcile-sccs")
        .about("Computes the security context constraints to create or update to match the recommended ones")
        .args(reconcile_args())
}

fn modify_role_args(subject: &'static str) -> Vec<Arg> {
    vec![
        Arg::new("role")
            .required(true)
            .index(1)
            .help("Name of the role"),
        Arg::new("subjects")
            .required(true)
            .index(2)
            .num_args(1..)
            .value_name(subject)
            .help("Names of the subjects"),
        Arg::new("binding")
            .long("binding")
            .value_name("FILE")
            .help("YAML file holding the RBAC RoleBinding or ClusterRoleBinding to modify"),
        Arg::new("namespace")
            .long("namespace")
            .short('n')
            .value_name("NAMESPACE")
            .default_value("default")
            .help("Namespace of the binding created when no binding file is given"),
    ]
}

fn subcommand_modify_role(
    name: &'static str,
    about: &'static str,
    subject: &'static str,
) -> Command {
    Command::new(name)
        .about(about)
        .args(modify_role_args(subject))
}

fn review_args() -> Vec<Arg> {
    vec![
        Arg::new("verb")
            .required(true)
            .index(1)
            .help("Verb of the request"),
        Arg::new("resource")
            .required(true)
            .index(2)
            .help("Resource of the request. A value starting with '/' is a non resource URL"),
        Arg::new("resource-name")
            .long("resource-name")
            .value_name("NAME")
            .default_value("")
            .help("Name of the resource"),
        Arg::new("api-group")
            .long("api-group")
            .value_name("GROUP")
            .default_value("")
            .help("API group of the resource"),
        file_arg(
            "policy",
            "YAML file holding Policy, PolicyBinding, ClusterPolicy and ClusterPolicyBinding objects",
        ),
        Arg::new("namespace")
            .long("namespace")
            .short('n')
            .value_name("NAMESPACE")
            .default_value("")
            .help("Namespace of the request"),
    ]
}

fn subcommand_who_can() -> Command {
    Command::new("who-can")
        .about("Lists the users and groups allowed to perform an action")
        .args(review_args())
}

fn subcommand_can_i() -> Command {
    Command::new("can-i")
        .about("Checks whether a user is allowed to perform an action")
        .args(review_args())
        .arg(
            Arg::new("user")
                .long("user")
                .value_name("USER")
                .required(true)
                .help("Name of the user"),
        )
        .arg(
            Arg::new("group")
                .long("group")
                .action(ArgAction::Append)
                .number_of_values(1)
                .value_name("GROUP")
                .help("Group of the user. Can be repeated multiple times"),
        )
}

pub fn build_cli() -> Command {
    let mut subcommands = vec![
        subcommand_convert(),
        subcommand_reconcile_cluster_roles(),
        subcommand_reconcile_cluster_role_bindings(),
        subcommand_reconcile_sccs(),
        subcommand_modify_role(
            "add-role-to-user",
            "Adds users to the binding of a role",
            "USER",
        ),
        subcommand_modify_role(
            "remove-role-from-user",
            "Removes users from the binding of a role",
            "USER",
        ),
        subcommand_modify_role(
            "add-role-to-group",
            "Adds groups to the binding of a role",
            "GROUP",
        ),
        subcommand_modify_role(
            "remove-role-from-group",
            "Removes groups from the binding of a role",
            "GROUP",
        ),
        subcommand_who_can(),
        subcommand_can_i(),
    ];
    subcommands.sort_by(|a, b| a.get_name().cmp(b.get_name()));

    Command::new(crate_name!())
        .version(crate_version!())
        .author(crate_authors!())
        .about(crate_description!())
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LOG_LEVEL")
                .env("OC_POLICY_LOG_LEVEL")
                .default_value("warn")
                .value_parser([
                    PossibleValue::new("trace"),
                    PossibleValue::new("debug"),
                    PossibleValue::new("info"),
                    PossibleValue::new("warn"),
                    PossibleValue::new("error"),
                ])
                .global(true)
                .help("Log level"),
        )
        .arg(
            Arg::new("log-fmt")
                .long("log-fmt")
                .value_name("LOG_FMT")
                .env("OC_POLICY_LOG_FMT")
                .default_value("text")
                .value_parser([PossibleValue::new("text"), PossibleValue::new("json")])
                .global(true)
                .help("Log output format"),
        )
        .arg(
            Arg::new("log-no-color")
                .long("log-no-color")
                .env("NO_COLOR")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Disable colored output for logs"),
        )
        .arg(
            Arg::new("master-namespace")
                .long("master-namespace")
                .value_name("NAMESPACE")
                .env("OC_POLICY_MASTER_NAMESPACE")
                .default_value(DEFAULT_MASTER_NAMESPACE)
                .global(true)
                .help("Namespace holding the cluster wide policy"),
        )
        .subcommands(subcommands)
        .long_version(VERSION_AND_RESOURCE_GROUPS.as_str())
        .subcommand_required(true)
        .arg_required_else_help(true)
}
