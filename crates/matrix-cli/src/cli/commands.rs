//! The clap command tree. One function, `build_cli`, describing every verb
//! in the CLI surface; dispatch lives in [`crate::cli::dispatch`].

use clap::{Arg, ArgAction, Command};

fn json_flag() -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Output as JSON")
}

pub fn build_cli() -> Command {
    Command::new("matrix")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Persistent developer-memory engine")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("status")
                .about("Show store health and the current repo's fingerprint")
                .arg(json_flag()),
        )
        .subcommand(
            Command::new("list")
                .about("List stored solutions, failures, or repos")
                .arg(
                    Arg::new("entity")
                        .value_parser(["solutions", "failures", "repos"])
                        .required(true),
                )
                .arg(Arg::new("page").long("page").value_name("N").default_value("1"))
                .arg(Arg::new("limit").long("limit").value_name("N").default_value("20"))
                .arg(Arg::new("repo-id").long("repo-id").value_name("ID"))
                .arg(json_flag()),
        )
        .subcommand(
            Command::new("search")
                .about("Recall the best-matching solutions for a problem description")
                .arg(Arg::new("query").required(true))
                .arg(Arg::new("limit").long("limit").value_name("N"))
                .arg(Arg::new("min-score").long("min-score").value_name("SCORE"))
                .arg(Arg::new("scope").long("scope").value_parser(["global", "stack", "repo"]))
                .arg(Arg::new("category").long("category"))
                .arg(json_flag()),
        )
        .subcommand(
            Command::new("store")
                .about("Store a new problem -> solution pair")
                .arg(Arg::new("problem").required(true))
                .arg(Arg::new("solution").required(true))
                .arg(Arg::new("scope").long("scope").value_parser(["global", "stack", "repo"]))
                .arg(Arg::new("category").long("category"))
                .arg(Arg::new("tags").long("tags").value_name("a,b,c"))
                .arg(json_flag()),
        )
        .subcommand(
            Command::new("reward")
                .about("Record the outcome of applying a stored solution")
                .arg(Arg::new("id").required(true))
                .arg(
                    Arg::new("outcome")
                        .required(true)
                        .value_parser(["success", "partial", "failure"]),
                )
                .arg(Arg::new("notes").long("notes").value_name("TEXT")),
        )
        .subcommand(
            Command::new("failure")
                .about("Record a failure, deduplicating by normalized signature")
                .arg(Arg::new("message").required(true))
                .arg(Arg::new("error-type").long("error-type").value_parser([
                    "runtime", "build", "test", "type", "other",
                ]))
                .arg(Arg::new("stack-trace").long("stack-trace").value_name("TEXT"))
                .arg(Arg::new("fix").long("fix").value_name("TEXT"))
                .arg(Arg::new("root-cause").long("root-cause").value_name("TEXT"))
                .arg(json_flag()),
        )
        .subcommand(
            Command::new("warn")
                .about("Manage file/package warnings")
                .subcommand_required(true)
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("target").required(true))
                        .arg(Arg::new("reason").required(true))
                        .arg(Arg::new("type").long("type").value_parser(["file", "package"]))
                        .arg(Arg::new("ecosystem").long("ecosystem").value_name("NAME"))
                        .arg(
                            Arg::new("severity")
                                .long("severity")
                                .value_parser(["info", "warn", "block"]),
                        )
                        .arg(Arg::new("repo-id").long("repo-id").value_name("ID")),
                )
                .subcommand(Command::new("remove").arg(Arg::new("id").required(true)))
                .subcommand(
                    Command::new("list")
                        .arg(Arg::new("repo-id").long("repo-id").value_name("ID"))
                        .arg(json_flag()),
                ),
        )
        .subcommand(
            Command::new("export")
                .about("Export stored solutions, failures, or repos")
                .arg(
                    Arg::new("format")
                        .long("format")
                        .value_parser(["json", "csv"])
                        .default_value("json"),
                )
                .arg(
                    Arg::new("type")
                        .long("type")
                        .value_parser(["solutions", "failures", "repos"])
                        .help("Required for --format csv; ignored for json (exports everything)"),
                )
                .arg(Arg::new("output").long("output").value_name("PATH")),
        )
        .subcommand(
            Command::new("config")
                .about("Inspect the resolved configuration")
                .subcommand_required(true)
                .subcommand(Command::new("get").arg(Arg::new("key").required(true)))
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("key").required(true))
                        .arg(Arg::new("value").required(true)),
                )
                .subcommand(Command::new("list")),
        )
        .subcommand(Command::new("doctor").about("Run a read-only store health check").arg(json_flag()))
        .subcommand(
            Command::new("dreamer")
                .about("Manage scheduled background tasks")
                .subcommand_required(true)
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").required(true))
                        .arg(Arg::new("schedule").required(true))
                        .arg(Arg::new("command").required(true))
                        .arg(
                            Arg::new("working-directory")
                                .long("working-directory")
                                .value_name("PATH"),
                        )
                        .arg(Arg::new("timeout").long("timeout").value_name("SECS"))
                        .arg(Arg::new("repo-id").long("repo-id").value_name("ID")),
                )
                .subcommand(
                    Command::new("list")
                        .arg(Arg::new("repo-id").long("repo-id").value_name("ID"))
                        .arg(json_flag()),
                )
                .subcommand(Command::new("run").arg(Arg::new("id").required(true)))
                .subcommand(Command::new("remove").arg(Arg::new("id").required(true)))
                .subcommand(
                    Command::new("history")
                        .arg(Arg::new("id").required(true))
                        .arg(Arg::new("limit").long("limit").value_name("N").default_value("20"))
                        .arg(json_flag()),
                )
                .subcommand(Command::new("logs").arg(Arg::new("id").required(true))),
        )
        .subcommand(Command::new("version").about("Print the version and exit"))
        .subcommand(
            Command::new("hook")
                .hide(true)
                .about("Read one JSON event from stdin, dispatch it, write one JSON response"),
        )
}
