//! §4.11 "add": register a task with the platform scheduling facility —
//! a launchd plist on macOS, a tagged crontab line on Linux. Registration
//! runs after the task row is inserted; callers must delete that row on
//! failure (§8.8's compensating rollback lives in [`super::add`]).

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use crate::domain::task::Task;
use crate::error::Error;
use crate::Result;

/// A line in the user's crontab that marks it as matrix-owned, so
/// [`unregister`] can find and remove exactly one task's entry.
fn crontab_tag(task_id: &str) -> String {
    format!("# matrix-task:{task_id}")
}

fn wrapped_command(task: &Task, log_dir: &Path) -> String {
    let out_log = log_dir.join(format!("{}.out.log", task.id));
    let err_log = log_dir.join(format!("{}.err.log", task.id));
    format!(
        "cd {} && {} >> {} 2>> {}",
        task.working_directory,
        task.command,
        out_log.display(),
        err_log.display()
    )
}

/// Register `task` with the native scheduling facility for this platform.
pub async fn register(task: Task, log_dir: PathBuf) -> Result<()> {
    tokio::task::spawn_blocking(move || register_blocking(&task, &log_dir))
        .await
        .map_err(|e| Error::Fatal(format!("registration task panicked: {e}")))?
}

/// Remove `task_id`'s native registration, if any.
pub async fn unregister(task_id: String) -> Result<()> {
    tokio::task::spawn_blocking(move || unregister_blocking(&task_id))
        .await
        .map_err(|e| Error::Fatal(format!("unregistration task panicked: {e}")))?
}

#[cfg(target_os = "macos")]
fn plist_path(task_id: &str) -> Result<PathBuf> {
    let home = std::env::var("HOME").map_err(|_| Error::Fatal("HOME is not set".to_string()))?;
    Ok(PathBuf::from(home)
        .join("Library/LaunchAgents")
        .join(format!("com.matrix.task.{task_id}.plist")))
}

#[cfg(target_os = "macos")]
fn label_for(task_id: &str) -> String {
    format!("com.matrix.task.{task_id}")
}

/// One launchd `StartCalendarInterval` trigger: `None` in a slot means that
/// field is unconstrained (omitted from the dict), matching launchd's own
/// "missing key = every value" rule.
type CalendarSlot = [Option<u32>; 5];

/// Expand one cron field (`*`, a number, a `a,b,c` list, an `a-b` range, or
/// an `a/step`/`*/step` step) to its concrete values within `[min, max]`.
/// Returns `[None]` for `*` or an empty expansion, meaning "unconstrained".
#[cfg(target_os = "macos")]
fn expand_cron_field(field: &str, min: u32, max: u32) -> Vec<Option<u32>> {
    if field == "*" {
        return vec![None];
    }

    let mut values = Vec::new();
    for part in field.split(',') {
        if let Some((base, step)) = part.split_once('/') {
            let step = step.parse::<u32>().unwrap_or(1).max(1);
            let (start, end) = if base == "*" {
                (min, max)
            } else if let Some((a, b)) = base.split_once('-') {
                (a.parse().unwrap_or(min), b.parse().unwrap_or(max))
            } else {
                (base.parse().unwrap_or(min), max)
            };
            let mut v = start;
            while v <= end {
                values.push(v);
                v += step;
            }
        } else if let Some((a, b)) = part.split_once('-') {
            values.extend(a.parse().unwrap_or(min)..=b.parse().unwrap_or(max));
        } else if let Ok(v) = part.parse::<u32>() {
            values.push(v);
        }
    }
    values.sort_unstable();
    values.dedup();
    if values.is_empty() {
        vec![None]
    } else {
        values.into_iter().map(Some).collect()
    }
}

/// Cartesian product of every field's expansion, one [`CalendarSlot`] per
/// combination. Cron's day-of-month/day-of-week "OR when both restricted"
/// rule isn't modeled; both fields are applied as a plain AND here.
#[cfg(target_os = "macos")]
fn calendar_slots(cron_expression: &str) -> Vec<CalendarSlot> {
    const CAP: usize = 500;

    let fields: Vec<&str> = cron_expression.split_whitespace().collect();
    let Some(&[_sec, minute, hour, day, month, weekday]) = fields.get(0..6).map(|f| <&[&str; 6]>::try_from(f).unwrap()) else {
        return vec![[None, None, None, None, None]];
    };

    let minutes = expand_cron_field(minute, 0, 59);
    let hours = expand_cron_field(hour, 0, 23);
    let days = expand_cron_field(day, 1, 31);
    let months = expand_cron_field(month, 1, 12);
    let weekdays = expand_cron_field(weekday, 0, 7);

    let mut slots = Vec::new();
    'outer: for &mi in &minutes {
        for &h in &hours {
            for &d in &days {
                for &mo in &months {
                    for &wd in &weekdays {
                        slots.push([mi, h, d, mo, wd]);
                        if slots.len() >= CAP {
                            break 'outer;
                        }
                    }
                }
            }
        }
    }
    slots
}

#[cfg(target_os = "macos")]
fn calendar_slot_xml(slot: &CalendarSlot) -> String {
    const KEYS: [&str; 5] = ["Minute", "Hour", "Day", "Month", "Weekday"];
    let mut entries = String::new();
    for (key, value) in KEYS.iter().zip(slot.iter()) {
        if let Some(v) = value {
            entries.push_str(&format!("    <key>{key}</key>\n    <integer>{v}</integer>\n"));
        }
    }
    format!("  <dict>\n{entries}  </dict>\n")
}

#[cfg(target_os = "macos")]
fn register_blocking(task: &Task, log_dir: &Path) -> Result<()> {
    let path = plist_path(&task.id)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let intervals: String = calendar_slots(&task.cron_expression).iter().map(calendar_slot_xml).collect();

    let plist = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
  <key>Label</key>
  <string>{label}</string>
  <key>ProgramArguments</key>
  <array>
    <string>/bin/sh</string>
    <string>-c</string>
    <string>{command}</string>
  </array>
  <key>StartCalendarInterval</key>
  <array>
{intervals}  </array>
  <key>RunAtLoad</key>
  <false/>
</dict>
</plist>
"#,
        label = label_for(&task.id),
        command = escape_xml(&wrapped_command(task, log_dir)),
    );

    std::fs::write(&path, plist)?;

    let status = std::process::Command::new("launchctl")
        .arg("load")
        .arg(&path)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output();

    match status {
        Ok(output) if output.status.success() => Ok(()),
        Ok(output) => {
            let _ = std::fs::remove_file(&path);
            Err(Error::Transient(format!(
                "launchctl load failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )))
        }
        Err(e) => {
            let _ = std::fs::remove_file(&path);
            Err(Error::Transient(format!("failed to invoke launchctl: {e}")))
        }
    }
}

#[cfg(target_os = "macos")]
fn unregister_blocking(task_id: &str) -> Result<()> {
    let path = plist_path(task_id)?;
    let _ = std::process::Command::new("launchctl")
        .arg("unload")
        .arg(&path)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    if path.exists() {
        std::fs::remove_file(&path)?;
    }
    Ok(())
}

#[cfg(target_os = "macos")]
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(target_os = "linux")]
fn read_crontab() -> Result<String> {
    let output = std::process::Command::new("crontab")
        .arg("-l")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| Error::Transient(format!("failed to invoke crontab: {e}")))?;
    if !output.status.success() {
        // An empty crontab exits non-zero with "no crontab for user"; treat as empty.
        return Ok(String::new());
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

#[cfg(target_os = "linux")]
fn write_crontab(content: &str) -> Result<()> {
    let mut child = std::process::Command::new("crontab")
        .arg("-")
        .stdin(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| Error::Transient(format!("failed to invoke crontab: {e}")))?;
    child
        .stdin
        .take()
        .ok_or_else(|| Error::Transient("crontab stdin unavailable".to_string()))?
        .write_all(content.as_bytes())?;
    let output = child
        .wait_with_output()
        .map_err(|e| Error::Transient(format!("crontab write failed: {e}")))?;
    if !output.status.success() {
        return Err(Error::Transient(format!(
            "crontab rejected the new table: {}",
            String::from_utf8_lossy(&output.stderr)
        )));
    }
    Ok(())
}

#[cfg(target_os = "linux")]
fn register_blocking(task: &Task, log_dir: &Path) -> Result<()> {
    which::which("crontab")
        .map_err(|_| Error::Transient("crontab binary not found on PATH".to_string()))?;

    let existing = read_crontab()?;
    let tag = crontab_tag(&task.id);
    let line = format!(
        "{} {} {}\n",
        task.cron_expression,
        wrapped_command(task, log_dir),
        tag
    );
    let updated = format!("{existing}{line}");
    write_crontab(&updated)
}

#[cfg(target_os = "linux")]
fn unregister_blocking(task_id: &str) -> Result<()> {
    let tag = crontab_tag(task_id);
    let existing = read_crontab()?;
    let filtered: String = existing
        .lines()
        .filter(|line| !line.ends_with(&tag))
        .map(|line| format!("{line}\n"))
        .collect();
    write_crontab(&filtered)
}

#[cfg(not(any(target_os = "macos", target_os = "linux")))]
fn register_blocking(_task: &Task, _log_dir: &Path) -> Result<()> {
    Err(Error::Transient(
        "no native scheduling facility on this platform".to_string(),
    ))
}

#[cfg(not(any(target_os = "macos", target_os = "linux")))]
fn unregister_blocking(_task_id: &str) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_command_appends_log_redirection() {
        let now = chrono::Utc::now();
        let task = Task {
            id: "task_1".to_string(),
            name: "n".to_string(),
            cron_expression: "0 0 0 * * *".to_string(),
            timezone: "local".to_string(),
            command: "echo hi".to_string(),
            working_directory: "/tmp/proj".to_string(),
            timeout: 300,
            env: std::collections::HashMap::new(),
            enabled: true,
            worktree: None,
            tags: Vec::new(),
            repo_id: None,
            created_at: now,
            updated_at: now,
        };
        let wrapped = wrapped_command(&task, Path::new("/tmp/logs"));
        assert!(wrapped.contains("cd /tmp/proj"));
        assert!(wrapped.contains("task_1.out.log"));
        assert!(wrapped.contains("task_1.err.log"));
    }

    #[cfg(target_os = "macos")]
    #[test]
    fn calendar_slots_for_a_single_daily_time_is_one_fully_constrained_slot() {
        let slots = calendar_slots("0 30 8 * * *");
        assert_eq!(slots, vec![[Some(30), Some(8), None, None, None]]);
    }

    #[cfg(target_os = "macos")]
    #[test]
    fn calendar_slots_expand_a_minute_step_and_a_weekday_range() {
        let slots = calendar_slots("0 0/15 9 * * 1-5");
        // 4 minute values (0, 15, 30, 45) x 5 weekdays (1..=5).
        assert_eq!(slots.len(), 20);
        assert!(slots.contains(&[Some(0), Some(9), None, None, Some(1)]));
        assert!(slots.contains(&[Some(45), Some(9), None, None, Some(5)]));
    }

    #[cfg(target_os = "macos")]
    #[test]
    fn calendar_slots_for_all_wildcards_is_one_unconstrained_slot() {
        assert_eq!(calendar_slots("0 * * * * *"), vec![[None, None, None, None, None]]);
    }
}
