use std::io::{self, Write};

use backlog_notify_api::RunOutcome;

use crate::actions::Actions;

/// One group per updated ticket, then the summary line.
pub fn write<W: Write>(actions: &mut Actions<W>, outcome: &RunOutcome) -> io::Result<()> {
    if let RunOutcome::Sent(outcomes) = outcome {
        for o in outcomes {
            actions.group(&format!("{}:", o.issue_key))?;
            for line in o.subject.lines() {
                actions.info(line)?;
            }
            if let Some(status) = o.status_message() {
                actions.info(&status)?;
            }
            actions.end_group()?;
        }
    }
    actions.info(&outcome.message())
}
