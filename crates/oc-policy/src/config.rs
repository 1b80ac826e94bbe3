use clap::ArgMatches;

pub struct Config {
    pub log_level: String,
    pub log_fmt: String,
    pub log_no_color: bool,
    /// Namespace holding the cluster wide policy, and where cluster scoped
    /// objects land when they are turned into namespaced ones.
    pub master_namespace: String,
}

impl Config {
    pub fn from_args(matches: &ArgMatches) -> Self {
        let log_level = matches
            .get_one::<String>("log-level")
            .expect("This should not happen, there's a default value for log-level")
            .to_owned();
        let log_fmt = matches
            .get_one::<String>("log-fmt")
            .expect("This should not happen, there's a default value for log-fmt")
            .to_owned();
        let log_no_color = matches.get_flag("log-no-color");
        let master_namespace = matches
            .get_one::<String>("master-namespace")
            .expect("This should not happen, there's a default value for master-namespace")
            .to_owned();

        Config {
            log_level,
            log_fmt,
            log_no_color,
            master_namespace,
        }
    }
}
