//! Integration tests driving whole programs through the public API.

use pretty_assertions::assert_eq;
use scriptcli::{
    ActionTable, ArgumentSpec, CommandBuilder, CommandTree, Invocation, OptionSpec, Outcome,
    ParseError, Terminal, Value, ValueType, complete, infer_all, parse, run_program,
};

#[derive(Default)]
struct Console {
    out: Vec<String>,
    err: Vec<String>,
    seen: Vec<Invocation>,
}

impl Terminal for Console {
    fn print(&mut self, message: &str) {
        self.out.push(message.to_string());
    }
    fn error(&mut self, message: &str) {
        self.err.push(message.to_string());
    }
}

fn record(console: &mut Console, inv: &Invocation) -> anyhow::Result<()> {
    console.seen.push(inv.clone());
    Ok(())
}

fn deploy() -> CommandTree {
    CommandBuilder::new("deploy.js")
        .name("deploy")
        .version("1.2.0")
        .description("Ship builds to servers")
        .option(
            OptionSpec::new("v", ValueType::Number)
                .choices([1, 2, 3])
                .default(2),
        )
        .action("deploy")
        .command(|c| {
            c.name("push")
                .description("Push to a host")
                .required_option(
                    OptionSpec::new("target", ValueType::String).description("Remote name"),
                )
                .argument(ArgumentSpec::new("host", ValueType::String))
                .argument(ArgumentSpec::new("threads", ValueType::Number))
                .action("push")
        })
        .build()
        .expect("valid tree")
}

fn actions() -> ActionTable<Console> {
    ActionTable::new()
        .on("deploy", record)
        .on("push", record)
}

fn words(raw: &[&str]) -> Vec<Value> {
    infer_all(raw)
}

mod options {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn value_in_choices_is_bound() {
        let inv = parse(&deploy(), &words(&["-v", "2"])).expect("parses");
        assert_eq!(inv.option("v"), Some(&Value::Number(2.0)));
    }

    #[test]
    fn value_outside_choices_is_rejected() {
        let err = parse(&deploy(), &words(&["-v", "5"])).unwrap_err();
        assert!(matches!(err, ParseError::OptionChoice { .. }));
    }

    #[test]
    fn omitted_option_takes_default() {
        let inv = parse(&deploy(), &[]).expect("parses");
        assert_eq!(inv.option_number("v"), Some(2.0));
    }

    #[test]
    fn required_option_missing_names_flag() {
        let err = parse(&deploy(), &words(&["push", "web", "4"])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Option '--target' is required but not provided for 'deploy/push'"
        );
    }
}

mod arguments {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn one_argument_short() {
        let mut console = Console::default();
        run_program(&deploy(), &actions(), &["push", "--target", "prod", "web"], &mut console)
            .expect("runs");
        assert_eq!(console.err, vec!["Missing argument 'threads' for 'deploy/push'"]);
        assert!(console.seen.is_empty());
    }

    #[test]
    fn one_argument_too_many() {
        let mut console = Console::default();
        run_program(
            &deploy(),
            &actions(),
            &["push", "--target", "prod", "web", "4", "extra"],
            &mut console,
        )
        .expect("runs");
        assert_eq!(console.err, vec!["Too many arguments provided for 'deploy/push'"]);
        assert!(console.seen.is_empty());
    }

    #[test]
    fn exact_count_dispatches() {
        let mut console = Console::default();
        let outcome = run_program(
            &deploy(),
            &actions(),
            &["push", "web", "4", "--target", "prod"],
            &mut console,
        )
        .expect("runs");
        assert_eq!(outcome, Outcome::Dispatched("deploy/push".into()));
        assert!(console.err.is_empty());

        let inv = &console.seen[0];
        assert_eq!(inv.arg_str(0), Some("web"));
        assert_eq!(inv.arg_number(1), Some(4.0));
        assert_eq!(inv.option_str("target"), Some("prod"));
    }

    #[test]
    fn numeric_words_reach_string_slots_verbatim() {
        let mut console = Console::default();
        let outcome = run_program(
            &deploy(),
            &actions(),
            &["push", "007", "4", "--target", "+5"],
            &mut console,
        )
        .expect("runs");
        assert_eq!(outcome, Outcome::Dispatched("deploy/push".into()));
        assert!(console.err.is_empty());

        let inv = &console.seen[0];
        assert_eq!(inv.arg_str(0), Some("007"));
        assert_eq!(inv.arg_number(1), Some(4.0));
        assert_eq!(inv.option_str("target"), Some("+5"));
    }
}

mod help_and_completion {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn help_ignores_missing_requirements() {
        let mut console = Console::default();
        let outcome =
            run_program(&deploy(), &actions(), &["push", "--help"], &mut console).expect("runs");
        assert_eq!(outcome, Outcome::PrintedHelp);
        let expected = "Help for deploy/push:
Push to a host

Arguments:
  <host> (string)
  <threads> (number)

Options:
  --target <string> (required)
    : Remote name";
        assert_eq!(console.out, vec![expected]);
    }

    #[test]
    fn completion_lists_subcommand_options() {
        assert_eq!(complete(&deploy(), &words(&["push"])), vec!["--target"]);
        assert_eq!(complete(&deploy(), &words(&[])), vec!["-v"]);
    }

    #[test]
    fn tree_serializes_without_closures() {
        let json = serde_json::to_value(deploy()).expect("serializes");
        assert_eq!(json["script"], "deploy.js");
        assert_eq!(json["nodes"][1]["action"], "push");
        assert_eq!(json["nodes"][0]["options"][0]["type"], "number");
    }
}
