//! Free-text commands to [`Operation`]s.
//!
//! ```text
//! add <name> [on|by <date> | from <date> to <date>] [#tag]... [!|!!]
//! del <index|name|#tag>
//! done <index|name>
//! set <index|name> ["new name"] [[date | a, b | none]] [!|!!]
//! view <all|general|deadlines|events|archive|expired|week|today|tomorrow|help>
//! view <low|medium|high|#tag...>
//! search <phrase>
//! undo | save | clear
//! ```

use crate::date;
use crate::error::ParseErrorKind;
use crate::model::{Operation, Priority, Schedule, Target, Task, TaskChange, ViewType};
use crate::tags::TagRegistry;
use std::collections::{BTreeSet, HashMap};
use time::OffsetDateTime;
use tracing::debug;

pub struct ParseContext<'a> {
    pub now: OffsetDateTime,
    pub tags: &'a TagRegistry,
}

#[derive(Debug, Default, Clone)]
pub struct CommandParser {
    aliases: HashMap<String, String>,
}

impl CommandParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aliases replace the first word of a line, e.g. `ls` -> `view all`.
    pub fn with_aliases(aliases: HashMap<String, String>) -> Self {
        let aliases = aliases
            .into_iter()
            .map(|(alias, expansion)| (alias.to_lowercase(), expansion))
            .collect();
        Self { aliases }
    }

    pub fn parse(&self, raw: &str, ctx: &ParseContext<'_>) -> Operation {
        let line = self.expand_alias(raw);
        let (word, rest) = split_command(&line);
        let command = word.to_lowercase();

        let parsed = match command.as_str() {
            "add" => parse_add(rest, ctx.now),
            "view" => parse_view(rest, ctx.tags),
            "del" => parse_delete(rest),
            "done" => parse_done(rest),
            "set" => parse_set(rest, ctx.now),
            "search" => parse_search(rest),
            "undo" => Ok(Operation::Undo),
            "save" => Ok(Operation::Save),
            "clear" => Ok(Operation::Clear),
            _ => Err(ParseErrorKind::NoSuchCommand),
        };
        let operation = parsed.unwrap_or_else(Operation::Error);

        debug!(command = %command, operation = operation.name(), "parsed command");
        operation
    }

    fn expand_alias(&self, raw: &str) -> String {
        let (word, rest) = split_command(raw.trim());
        match self.aliases.get(&word.to_lowercase()) {
            Some(expansion) if rest.is_empty() => expansion.trim().to_string(),
            Some(expansion) => format!("{} {rest}", expansion.trim()),
            None => raw.trim().to_string(),
        }
    }
}

fn split_command(line: &str) -> (&str, &str) {
    match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    }
}

fn normalize_name(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_bang_run(word: &str) -> bool {
    !word.is_empty() && word.chars().all(|ch| ch == '!')
}

/// Peels trailing `#tag` and `!` words off the end of `words`.
fn strip_decorations(words: &mut Vec<&str>) -> (BTreeSet<String>, Option<Priority>) {
    let mut tags = BTreeSet::new();
    let mut priority = None;

    while let Some(last) = words.last().copied() {
        if let Some(tag) = last.strip_prefix('#')
            && !tag.is_empty()
        {
            tags.insert(tag.to_lowercase());
        } else if is_bang_run(last) {
            priority = priority.max(Some(Priority::from_bangs(last.len())));
        } else {
            break;
        }
        words.pop();
    }

    (tags, priority)
}

/// Last position of `keyword` that still has at least one word after it.
fn last_keyword(words: &[&str], keyword: &str) -> Option<usize> {
    let searchable = words.len().checked_sub(1)?;
    words[..searchable]
        .iter()
        .rposition(|word| word.eq_ignore_ascii_case(keyword))
}

fn resolve_date(words: &[&str], now: OffsetDateTime) -> Result<OffsetDateTime, ParseErrorKind> {
    date::resolve(&words.join(" "), now).map_err(|_| ParseErrorKind::BadDateFormat)
}

fn event(start: OffsetDateTime, end: OffsetDateTime) -> Result<Schedule, ParseErrorKind> {
    if start > end {
        return Err(ParseErrorKind::InvalidEventRange);
    }
    Ok(Schedule::Event { start, end })
}

fn parse_add(rest: &str, now: OffsetDateTime) -> Result<Operation, ParseErrorKind> {
    let mut words: Vec<&str> = rest.split_whitespace().collect();
    let (tags, priority) = strip_decorations(&mut words);

    let (name_words, schedule) = if let Some(at) =
        last_keyword(&words, "on").or_else(|| last_keyword(&words, "by"))
    {
        let due = resolve_date(&words[at + 1..], now)?;
        (&words[..at], Schedule::Deadline { due })
    } else if let Some(from) = last_keyword(&words, "from")
        && let Some(to) = last_keyword(&words[from + 1..], "to").map(|to| from + 1 + to)
        && to > from + 1
    {
        let start = resolve_date(&words[from + 1..to], now)?;
        let end = resolve_date(&words[to + 1..], now)?;
        (&words[..from], event(start, end)?)
    } else {
        (&words[..], Schedule::Floating)
    };

    let name = normalize_name(&name_words.join(" "));
    if name.is_empty() {
        return Err(ParseErrorKind::EmptyTarget);
    }

    let task = Task {
        name,
        schedule,
        priority: priority.unwrap_or_default(),
        tags,
        completed: false,
    };
    Ok(Operation::Add(task))
}

fn parse_view(rest: &str, registry: &TagRegistry) -> Result<Operation, ParseErrorKind> {
    let target = rest.trim().to_lowercase();
    let view = match target.as_str() {
        "all" => ViewType::All,
        "general" => ViewType::General,
        "deadlines" => ViewType::Deadlines,
        "events" => ViewType::Events,
        "done" | "archive" => ViewType::Archive,
        "expired" => ViewType::Expired,
        "week" => ViewType::Week,
        "today" => ViewType::Today,
        "tomorrow" | "tmr" => ViewType::Tomorrow,
        "help" => ViewType::Help,
        other => match Priority::from_keyword(other) {
            Some(priority) => ViewType::Priority(priority),
            None => ViewType::Tags(registered_tags(other, registry)?),
        },
    };
    Ok(Operation::View(view))
}

fn registered_tags(text: &str, registry: &TagRegistry) -> Result<BTreeSet<String>, ParseErrorKind> {
    let mut tags = BTreeSet::new();
    for word in text.split_whitespace() {
        let tag = word.strip_prefix('#').unwrap_or(word);
        if tag.is_empty() || !registry.contains(tag) {
            return Err(ParseErrorKind::BadViewType);
        }
        tags.insert(tag.to_string());
    }

    if tags.is_empty() {
        return Err(ParseErrorKind::BadViewType);
    }
    Ok(tags)
}

fn parse_delete(rest: &str) -> Result<Operation, ParseErrorKind> {
    if rest.is_empty() {
        return Err(ParseErrorKind::EmptyTarget);
    }

    if let Some((_, after)) = rest.split_once('#') {
        let tag = after
            .split(|ch: char| ch.is_whitespace() || ch == '#')
            .next()
            .unwrap_or_default();
        if tag.is_empty() {
            return Err(ParseErrorKind::EmptyTag);
        }
        return Ok(Operation::DeleteByTag(tag.to_lowercase()));
    }

    Ok(match parse_index(rest) {
        Some(index) => Operation::DeleteByIndex(index),
        None => Operation::DeleteByName(normalize_name(rest)),
    })
}

fn parse_done(rest: &str) -> Result<Operation, ParseErrorKind> {
    if rest.is_empty() {
        return Err(ParseErrorKind::EmptyTarget);
    }

    Ok(match parse_index(rest) {
        Some(index) => Operation::DoneByIndex(index),
        None => Operation::DoneByName(normalize_name(rest)),
    })
}

/// An optionally signed run of digits. Runs too long for `i64` saturate, so
/// they stay indices and resolve as out of range.
fn parse_index(text: &str) -> Option<i64> {
    let digits = text.strip_prefix(|ch: char| ch == '-' || ch == '+').unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    let saturated = if text.starts_with('-') { i64::MIN } else { i64::MAX };
    Some(text.parse().unwrap_or(saturated))
}

fn parse_search(rest: &str) -> Result<Operation, ParseErrorKind> {
    if rest.is_empty() {
        return Err(ParseErrorKind::EmptyTarget);
    }
    Ok(Operation::Search(normalize_name(rest)))
}

fn parse_set(rest: &str, now: OffsetDateTime) -> Result<Operation, ParseErrorKind> {
    let (head, mut tail) = match rest.find(|ch: char| ch == '"' || ch == '[') {
        Some(at) => rest.split_at(at),
        None => (rest, ""),
    };

    let mut change = TaskChange::default();
    let mut target_words: Vec<&str> = head.split_whitespace().collect();
    while let Some(last) = target_words.last().copied() {
        if !is_bang_run(last) {
            break;
        }
        change.priority = change.priority.max(Some(Priority::from_bangs(last.len())));
        target_words.pop();
    }

    while !tail.is_empty() {
        if let Some(quoted) = tail.strip_prefix('"') {
            let (name, after) = quoted
                .split_once('"')
                .ok_or(ParseErrorKind::BadUpdateFormat)?;
            let name = normalize_name(name);
            if name.is_empty() {
                return Err(ParseErrorKind::BadUpdateFormat);
            }
            change.name = Some(name);
            tail = after.trim_start();
        } else if let Some(bracketed) = tail.strip_prefix('[') {
            let (spec, after) = bracketed
                .split_once(']')
                .ok_or(ParseErrorKind::BadUpdateFormat)?;
            change.schedule = Some(parse_schedule_spec(spec, now)?);
            tail = after.trim_start();
        } else {
            let (word, after) = split_command(tail);
            if !is_bang_run(word) {
                return Err(ParseErrorKind::BadUpdateFormat);
            }
            change.priority = change.priority.max(Some(Priority::from_bangs(word.len())));
            tail = after;
        }
    }

    if target_words.is_empty() {
        return Err(ParseErrorKind::EmptyTarget);
    }
    if change.is_empty() {
        return Err(ParseErrorKind::BadUpdateFormat);
    }

    let target_text = target_words.join(" ");
    let target = match parse_index(&target_text) {
        Some(index) => Target::Index(index),
        None => Target::Name(target_text),
    };
    Ok(Operation::Update { target, change })
}

/// `none`, `<date>` or `<start>, <end>`.
fn parse_schedule_spec(spec: &str, now: OffsetDateTime) -> Result<Schedule, ParseErrorKind> {
    let spec = spec.trim();
    if spec.eq_ignore_ascii_case("none") {
        return Ok(Schedule::Floating);
    }

    let resolve = |text: &str| date::resolve(text, now).map_err(|_| ParseErrorKind::BadDateFormat);
    match spec.split_once(',') {
        Some((start, end)) => event(resolve(start)?, resolve(end)?),
        None => Ok(Schedule::Deadline { due: resolve(spec)? }),
    }
}

#[cfg(test)]
mod tests {
    use super::{CommandParser, ParseContext};
    use crate::error::ParseErrorKind;
    use crate::model::{Operation, Priority, Schedule, Target, Task, TaskChange, ViewType};
    use crate::tags::TagRegistry;
    use std::collections::HashMap;
    use time::macros::datetime;

    const NOW: time::OffsetDateTime = datetime!(2026-10-14 10:00 UTC);

    fn parse_with(line: &str, registry: &TagRegistry) -> Operation {
        let ctx = ParseContext {
            now: NOW,
            tags: registry,
        };
        CommandParser::new().parse(line, &ctx)
    }

    fn parse(line: &str) -> Operation {
        parse_with(line, &TagRegistry::new())
    }

    fn added(line: &str) -> Task {
        match parse(line) {
            Operation::Add(task) => task,
            other => panic!("expected add, got {other:?}"),
        }
    }

    #[test]
    fn unknown_commands_are_errors() {
        assert_eq!(parse("fly away"), Operation::Error(ParseErrorKind::NoSuchCommand));
        assert_eq!(parse(""), Operation::Error(ParseErrorKind::NoSuchCommand));
        assert_eq!(parse("UNDO"), Operation::Undo);
    }

    #[test]
    fn add_floating_with_tags_and_priority() {
        let task = added("add buy milk #Home #errand !!");
        assert_eq!(task.name, "buy milk");
        assert_eq!(task.schedule, Schedule::Floating);
        assert_eq!(task.priority, Priority::High);
        assert_eq!(
            task.tags.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["errand", "home"]
        );
    }

    #[test]
    fn lone_hash_stays_in_the_name() {
        let task = added("add call # 5");
        assert_eq!(task.name, "call # 5");
        assert!(task.tags.is_empty());
    }

    #[test]
    fn add_deadline_uses_last_keyword() {
        let task = added("add carry on wayward son on 20 oct 2026 !");
        assert_eq!(task.name, "carry on wayward son");
        assert_eq!(
            task.schedule,
            Schedule::Deadline {
                due: datetime!(2026-10-20 23:59:59 UTC)
            }
        );
        assert_eq!(task.priority, Priority::Medium);

        let task = added("add report by tomorrow");
        assert_eq!(task.name, "report");
        assert_eq!(
            task.schedule,
            Schedule::Deadline {
                due: datetime!(2026-10-15 23:59:59 UTC)
            }
        );
    }

    #[test]
    fn trailing_keyword_without_date_is_part_of_the_name() {
        let task = added("add hold on");
        assert_eq!(task.name, "hold on");
        assert_eq!(task.schedule, Schedule::Floating);
    }

    #[test]
    fn add_event_range() {
        let task = added("add meetup from 30 dec 5pm to 31 dec 3pm #social");
        assert_eq!(task.name, "meetup");
        assert_eq!(
            task.schedule,
            Schedule::Event {
                start: datetime!(2026-12-30 17:00 UTC),
                end: datetime!(2026-12-31 15:00 UTC),
            }
        );
        assert!(task.tags.contains("social"));
    }

    #[test]
    fn add_rejects_bad_input() {
        assert_eq!(
            parse("add party on the moon"),
            Operation::Error(ParseErrorKind::BadDateFormat)
        );
        assert_eq!(
            parse("add trip from 31 dec to 1 dec"),
            Operation::Error(ParseErrorKind::InvalidEventRange)
        );
        assert_eq!(parse("add #only"), Operation::Error(ParseErrorKind::EmptyTarget));
        assert_eq!(parse("add on today"), Operation::Error(ParseErrorKind::EmptyTarget));
    }

    #[test]
    fn delete_targets() {
        assert_eq!(parse("del 3"), Operation::DeleteByIndex(3));
        assert_eq!(parse("del -1"), Operation::DeleteByIndex(-1));
        assert_eq!(parse("del buy  milk"), Operation::DeleteByName("buy milk".into()));
        assert_eq!(parse("del #Work"), Operation::DeleteByTag("work".into()));
        assert_eq!(parse("del #"), Operation::Error(ParseErrorKind::EmptyTag));
        assert_eq!(parse("del"), Operation::Error(ParseErrorKind::EmptyTarget));
    }

    #[test]
    fn done_targets() {
        assert_eq!(parse("done 2"), Operation::DoneByIndex(2));
        assert_eq!(parse("done buy milk"), Operation::DoneByName("buy milk".into()));
        assert_eq!(parse("done "), Operation::Error(ParseErrorKind::EmptyTarget));
    }

    #[test]
    fn oversized_numbers_stay_indices() {
        assert_eq!(
            parse("del 99999999999999999999"),
            Operation::DeleteByIndex(i64::MAX)
        );
        assert_eq!(
            parse("done -99999999999999999999"),
            Operation::DoneByIndex(i64::MIN)
        );
        assert_eq!(
            parse("set 99999999999999999999 !"),
            Operation::Update {
                target: Target::Index(i64::MAX),
                change: TaskChange {
                    priority: Some(Priority::Medium),
                    ..TaskChange::default()
                },
            }
        );
        assert_eq!(parse("del 12 monkeys"), Operation::DeleteByName("12 monkeys".into()));
        assert_eq!(parse("done -"), Operation::DoneByName("-".into()));
    }

    #[test]
    fn set_changes_name_date_and_priority() {
        assert_eq!(
            parse("set 1 \"new name\" [31 dec] !!"),
            Operation::Update {
                target: Target::Index(1),
                change: TaskChange {
                    name: Some("new name".into()),
                    schedule: Some(Schedule::Deadline {
                        due: datetime!(2026-12-31 23:59:59 UTC)
                    }),
                    priority: Some(Priority::High),
                },
            }
        );
        assert_eq!(
            parse("set old task [none]"),
            Operation::Update {
                target: Target::Name("old task".into()),
                change: TaskChange {
                    schedule: Some(Schedule::Floating),
                    ..TaskChange::default()
                },
            }
        );
        assert_eq!(
            parse("set 2 !"),
            Operation::Update {
                target: Target::Index(2),
                change: TaskChange {
                    priority: Some(Priority::Medium),
                    ..TaskChange::default()
                },
            }
        );
    }

    #[test]
    fn set_event_range() {
        let op = parse("set 1 [30 dec 5pm, 31 dec 3pm]");
        let Operation::Update { change, .. } = op else {
            panic!("expected update");
        };
        assert_eq!(
            change.schedule,
            Some(Schedule::Event {
                start: datetime!(2026-12-30 17:00 UTC),
                end: datetime!(2026-12-31 15:00 UTC),
            })
        );
    }

    #[test]
    fn set_rejects_malformed_changes() {
        assert_eq!(parse("set 1"), Operation::Error(ParseErrorKind::BadUpdateFormat));
        assert_eq!(
            parse("set 1 \"unterminated"),
            Operation::Error(ParseErrorKind::BadUpdateFormat)
        );
        assert_eq!(parse("set 1 [31 dec"), Operation::Error(ParseErrorKind::BadUpdateFormat));
        assert_eq!(parse("set 1 \"x\" junk"), Operation::Error(ParseErrorKind::BadUpdateFormat));
        assert_eq!(parse("set \"x\""), Operation::Error(ParseErrorKind::EmptyTarget));
        assert_eq!(parse("set 1 [someday]"), Operation::Error(ParseErrorKind::BadDateFormat));
    }

    #[test]
    fn view_keywords_and_priorities() {
        assert_eq!(parse("view ALL"), Operation::View(ViewType::All));
        assert_eq!(parse("view done"), Operation::View(ViewType::Archive));
        assert_eq!(parse("view tmr"), Operation::View(ViewType::Tomorrow));
        assert_eq!(
            parse("view high"),
            Operation::View(ViewType::Priority(Priority::High))
        );
        assert_eq!(parse("view nowhere"), Operation::Error(ParseErrorKind::BadViewType));
        assert_eq!(parse("view"), Operation::Error(ParseErrorKind::BadViewType));
    }

    #[test]
    fn view_tags_must_be_registered() {
        let mut registry = TagRegistry::new();
        registry.add_all(&vec!["home".to_string(), "work".to_string()]);

        assert_eq!(
            parse_with("view #home #work", &registry),
            Operation::View(ViewType::Tags(["home".to_string(), "work".to_string()].into()))
        );
        assert_eq!(
            parse_with("view home", &registry),
            Operation::View(ViewType::Tags(["home".to_string()].into()))
        );
        assert_eq!(
            parse_with("view #home #gym", &registry),
            Operation::Error(ParseErrorKind::BadViewType)
        );
    }

    #[test]
    fn search_needs_a_phrase() {
        assert_eq!(parse("search  of mice "), Operation::Search("of mice".into()));
        assert_eq!(parse("search"), Operation::Error(ParseErrorKind::EmptyTarget));
    }

    #[test]
    fn aliases_expand_the_first_word() {
        let aliases: HashMap<String, String> = [
            ("ls".to_string(), "view all".to_string()),
            ("t".to_string(), "add".to_string()),
        ]
        .into_iter()
        .collect();
        let parser = CommandParser::with_aliases(aliases);
        let registry = TagRegistry::new();
        let ctx = ParseContext {
            now: NOW,
            tags: &registry,
        };

        assert_eq!(parser.parse("LS", &ctx), Operation::View(ViewType::All));
        assert_eq!(
            parser.parse("t water plants", &ctx),
            Operation::Add(Task::new("water plants"))
        );
    }
}
