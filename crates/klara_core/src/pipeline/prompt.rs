//! Instruction templates for the inference collaborator.
//!
//! Templates carry a `{today}` placeholder; [`render`] fills it with the
//! explicit current date and weekday so relative dates resolve against the
//! caller's clock, not the model's.

use crate::model::datetime::format_date;
use chrono::NaiveDate;

const PERSONA: &str = "You help busy parents offload their mental load. \
The user writes a quick, unstructured brain dump; you turn it into structured records.";

const DATE_RULES: &str = "DATES AND TIMES:
- Today is {today}. Resolve relative expressions (\"tomorrow\", \"next Thursday\", \"October 25th\") against it.
- A date without a year means its next occurrence on or after today.
- Dates use YYYY-MM-DD. Times use 24-hour HH:MM (2:30pm becomes 14:30).";

const DECOMPOSITION_RULES: &str = "TASKS:
- description: clear and concise, 5-10 words.
- due_date: only when a deadline is mentioned.
- Decide should_decompose:
  * decompose when the task has several distinct steps, would take more than 30 minutes,
    or feels overwhelming as one item;
  * do NOT decompose single actions (\"Call the babysitter\", \"Pick up dry cleaning\")
    or tasks that are already specific (\"Send email to teacher about field trip\").
- When decomposing, give 3 to 7 concrete subtasks in the order they should happen,
  numbered with order = 1, 2, 3, ... Each gets a realistic estimated_minutes and may
  get a due_date no later than the parent's.
- estimated_minutes for the task: the sum of the subtask estimates when decomposed,
  otherwise a realistic estimate.
- Reference estimates: phone calls 5-15, quick errands 15-30, research 30-90,
  planning 30-120, organizing 60-180 minutes.
- reasoning: one short sentence explaining the decomposition decision.
- Example: \"Plan Noah's birthday party\" decomposes into: create guest list, book venue,
  order cake, buy decorations, send invitations, plan activities.";

const SHOPPING_RULES: &str = "SHOPPING ITEMS:
- One entry per distinct item. \"milk, eggs, bread, and cheese\" is four entries.
- Never merge several items into one description.
- Keep quantities inline (\"2 dozen eggs\", \"1 gallon of milk\").
- Keep descriptions short; drop filler like \"buy\" or \"from the store\".";

const CALENDAR_RULES: &str = "CALENDAR EVENTS:
- description: 5-10 words.
- event_date is REQUIRED; event_time only when a time is mentioned.";

const DETECTION_TEMPLATE: &str = "{persona}

Classify the brain dump into exactly ONE category:
- task: something to do or an action to complete
- shopping_list: things to buy
- calendar_event: an appointment or activity at a specific date or time

If several apply, pick the single best fit. Answer with the category only.";

const TASK_TEMPLATE: &str = "{persona}

Extract ONE task from the brain dump.

{decomposition}

{dates}";

const SHOPPING_TEMPLATE: &str = "{persona}

Extract every item the user wants to buy.

{shopping}";

const CALENDAR_TEMPLATE: &str = "{persona}

Extract ONE calendar event from the brain dump.

{calendar}

{dates}";

const BRAIN_DUMP_TEMPLATE: &str = "{persona}

Extract ALL items from the brain dump. One brain dump may contain several categories
and several items per category:
- tasks: things to do
- shopping_items: things to buy
- calendar_events: appointments and activities at a specific date or time

Examples:
- \"Call the babysitter and buy milk\" -> 1 task + 1 shopping item
- \"Buy eggs, milk, and bread\" -> 3 shopping items
- \"Call dentist, schedule car service, and pick up dry cleaning\" -> 3 tasks
- \"Soccer practice Thursday at 4pm and dentist Friday at 2pm\" -> 2 calendar events

Leave a list empty when nothing belongs in it.

{decomposition}

{shopping}

{calendar}

{dates}";

/// Which instruction set a prompt is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Detection,
    Task,
    Shopping,
    Calendar,
    BrainDump,
}

/// Renders the system prompt for `kind` against `today`.
pub fn render(kind: PromptKind, today: NaiveDate) -> String {
    let template = match kind {
        PromptKind::Detection => DETECTION_TEMPLATE,
        PromptKind::Task => TASK_TEMPLATE,
        PromptKind::Shopping => SHOPPING_TEMPLATE,
        PromptKind::Calendar => CALENDAR_TEMPLATE,
        PromptKind::BrainDump => BRAIN_DUMP_TEMPLATE,
    };

    let today = format!("{} ({})", format_date(today), today.format("%A"));
    template
        .replace("{persona}", PERSONA)
        .replace("{decomposition}", DECOMPOSITION_RULES)
        .replace("{shopping}", SHOPPING_RULES)
        .replace("{calendar}", CALENDAR_RULES)
        .replace("{dates}", DATE_RULES)
        .replace("{today}", &today)
}
