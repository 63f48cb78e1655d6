//! The goal store: canonical collection of goals and the only mutation surface.
//!
//! Every operation looks up and validates everything it needs before touching
//! the tree, so a rejected call leaves the store exactly as it was. Aggregate
//! counts are never stored; see `progress` for the derived values.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GoalError, GoalResult};
use crate::goal::{Goal, NewGoal, Period, Task};

/// Outcome of flipping a task's completion flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Toggle {
    /// Completion flag after the toggle.
    pub completed: bool,
    /// True only for the false -> true transition.
    pub became_completed: bool,
}

/// Every goal, in creation order. Periods and tasks are owned by their goal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GoalStore {
    goals: Vec<Goal>,
}

impl GoalStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// All goals in creation order.
    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    /// Number of goals.
    pub fn len(&self) -> usize {
        self.goals.len()
    }

    /// True when there are no goals.
    pub fn is_empty(&self) -> bool {
        self.goals.is_empty()
    }

    /// Get a goal by exact id.
    pub fn goal(&self, goal_id: &str) -> Option<&Goal> {
        self.goals.iter().find(|g| g.id == goal_id)
    }

    /// Get a period by exact goal and period id.
    pub fn period(&self, goal_id: &str, period_id: &str) -> Option<&Period> {
        self.goal(goal_id)?.period(period_id)
    }

    fn goal_mut(&mut self, goal_id: &str) -> GoalResult<&mut Goal> {
        self.goals
            .iter_mut()
            .find(|g| g.id == goal_id)
            .ok_or_else(|| GoalError::not_found(format!("goal {goal_id}")))
    }

    fn period_mut(&mut self, goal_id: &str, period_id: &str) -> GoalResult<&mut Period> {
        self.goal_mut(goal_id)?
            .period_mut(period_id)
            .ok_or_else(|| GoalError::not_found(format!("period {period_id} in goal {goal_id}")))
    }

    fn task_mut(&mut self, goal_id: &str, period_id: &str, task_id: &str) -> GoalResult<&mut Task> {
        self.period_mut(goal_id, period_id)?
            .task_mut(task_id)
            .ok_or_else(|| GoalError::not_found(format!("task {task_id} in period {period_id}")))
    }

    /// Create a goal with an empty period list and return its id.
    pub fn create_goal(&mut self, input: NewGoal) -> GoalResult<String> {
        let goal = Goal::new(input)?;
        let id = goal.id.clone();
        debug!(goal = %id, title = %goal.title, "created goal");
        self.goals.push(goal);
        Ok(id)
    }

    /// Remove a goal together with all of its periods and tasks.
    pub fn delete_goal(&mut self, goal_id: &str) -> GoalResult<Goal> {
        let idx = self
            .goals
            .iter()
            .position(|g| g.id == goal_id)
            .ok_or_else(|| GoalError::not_found(format!("goal {goal_id}")))?;
        let removed = self.goals.remove(idx);
        debug!(goal = %goal_id, periods = removed.periods.len(), "deleted goal");
        Ok(removed)
    }

    /// Replace a goal's title. Blank titles are rejected.
    pub fn rename_goal(&mut self, goal_id: &str, title: &str) -> GoalResult<()> {
        let title = title.trim();
        if title.is_empty() {
            return Err(GoalError::validation("goal title cannot be empty"));
        }
        self.goal_mut(goal_id)?.title = title.to_string();
        Ok(())
    }

    /// Append a period to a goal and return its id.
    pub fn add_period(
        &mut self,
        goal_id: &str,
        name: &str,
        end_date: Option<NaiveDate>,
    ) -> GoalResult<String> {
        let goal = self.goal_mut(goal_id)?;
        let period = Period::new(name, end_date)?;
        let id = period.id.clone();
        debug!(goal = %goal_id, period = %id, "added period");
        goal.periods.push(period);
        Ok(id)
    }

    /// Remove a period and every task inside it.
    pub fn delete_period(&mut self, goal_id: &str, period_id: &str) -> GoalResult<Period> {
        let goal = self.goal_mut(goal_id)?;
        let idx = goal
            .periods
            .iter()
            .position(|p| p.id == period_id)
            .ok_or_else(|| GoalError::not_found(format!("period {period_id} in goal {goal_id}")))?;
        let removed = goal.periods.remove(idx);
        debug!(goal = %goal_id, period = %period_id, tasks = removed.tasks.len(), "deleted period");
        Ok(removed)
    }

    /// Replace a period's name. Blank names are rejected.
    pub fn rename_period(&mut self, goal_id: &str, period_id: &str, name: &str) -> GoalResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GoalError::validation("period name cannot be empty"));
        }
        self.period_mut(goal_id, period_id)?.name = name.to_string();
        Ok(())
    }

    /// Set a period's deadline, or clear it with `None`.
    pub fn set_period_deadline(
        &mut self,
        goal_id: &str,
        period_id: &str,
        end_date: Option<NaiveDate>,
    ) -> GoalResult<()> {
        self.period_mut(goal_id, period_id)?.end_date = end_date;
        Ok(())
    }

    /// Append an open task to a period and return its id.
    pub fn add_task(&mut self, goal_id: &str, period_id: &str, text: &str) -> GoalResult<String> {
        let task = Task::new(text)?;
        let period = self.period_mut(goal_id, period_id)?;
        let id = task.id.clone();
        debug!(period = %period_id, task = %id, "added task");
        period.tasks.push(task);
        Ok(id)
    }

    /// Flip a task's completion flag.
    ///
    /// The returned `became_completed` is the completion cue; progress itself is
    /// always derived from the flags and changes in both directions.
    pub fn toggle_task(&mut self, goal_id: &str, period_id: &str, task_id: &str) -> GoalResult<Toggle> {
        let task = self.task_mut(goal_id, period_id, task_id)?;
        task.completed = !task.completed;
        debug!(task = %task_id, completed = task.completed, "toggled task");
        Ok(Toggle {
            completed: task.completed,
            became_completed: task.completed,
        })
    }

    /// Replace a task's text. Blank text is rejected.
    pub fn edit_task(&mut self, goal_id: &str, period_id: &str, task_id: &str, text: &str) -> GoalResult<()> {
        let text = text.trim();
        if text.is_empty() {
            return Err(GoalError::validation("task text cannot be empty"));
        }
        self.task_mut(goal_id, period_id, task_id)?.text = text.to_string();
        Ok(())
    }

    /// Remove a single task from its period.
    pub fn delete_task(&mut self, goal_id: &str, period_id: &str, task_id: &str) -> GoalResult<Task> {
        let period = self.period_mut(goal_id, period_id)?;
        let idx = period
            .tasks
            .iter()
            .position(|t| t.id == task_id)
            .ok_or_else(|| GoalError::not_found(format!("task {task_id} in period {period_id}")))?;
        debug!(period = %period_id, task = %task_id, "deleted task");
        Ok(period.tasks.remove(idx))
    }

    /// Check a store that did not come through the mutation methods, such as a
    /// loaded or imported document: titles, names and task text are non-blank,
    /// durations are positive, and ids are unique within each collection.
    pub fn validate(&self) -> GoalResult<()> {
        unique_ids(&self.goals, "goal", |g| &g.id)?;
        for goal in &self.goals {
            if goal.title.trim().is_empty() {
                return Err(GoalError::validation(format!("goal {} has an empty title", goal.id)));
            }
            if goal.duration == 0 {
                return Err(GoalError::validation(format!("goal {} has a zero duration", goal.id)));
            }
            unique_ids(&goal.periods, "period", |p| &p.id)?;
            for period in &goal.periods {
                if period.name.trim().is_empty() {
                    return Err(GoalError::validation(format!("period {} has an empty name", period.id)));
                }
                unique_ids(&period.tasks, "task", |t| &t.id)?;
                if let Some(task) = period.tasks.iter().find(|t| t.text.trim().is_empty()) {
                    return Err(GoalError::validation(format!("task {} has empty text", task.id)));
                }
            }
        }
        Ok(())
    }

    /// Resolve a user-supplied goal reference to a goal id.
    pub fn resolve_goal(&self, identifier: &str) -> GoalResult<String> {
        resolve(&self.goals, identifier, "goal", |g| &g.id, |g| &g.title)
    }

    /// Resolve a period reference within one goal.
    pub fn resolve_period(&self, goal_id: &str, identifier: &str) -> GoalResult<String> {
        let goal = self
            .goal(goal_id)
            .ok_or_else(|| GoalError::not_found(format!("goal {goal_id}")))?;
        resolve(&goal.periods, identifier, "period", |p| &p.id, |p| &p.name)
    }

    /// Resolve a task reference within one period.
    pub fn resolve_task(&self, goal_id: &str, period_id: &str, identifier: &str) -> GoalResult<String> {
        let period = self
            .period(goal_id, period_id)
            .ok_or_else(|| GoalError::not_found(format!("period {period_id} in goal {goal_id}")))?;
        resolve(&period.tasks, identifier, "task", |t| &t.id, |t| &t.text)
    }
}

fn unique_ids<T>(items: &[T], what: &str, id_of: impl Fn(&T) -> &String) -> GoalResult<()> {
    let mut seen = HashSet::new();
    for item in items {
        let id = id_of(item);
        if id.trim().is_empty() {
            return Err(GoalError::validation(format!("{what} with an empty id")));
        }
        if !seen.insert(id.as_str()) {
            return Err(GoalError::validation(format!("duplicate {what} id {id}")));
        }
    }
    Ok(())
}

/// Resolve `identifier` against `items`, trying in order: exact id, `#N`
/// position (1-based), unique id prefix, unique case-insensitive label.
fn resolve<T>(
    items: &[T],
    identifier: &str,
    what: &str,
    id_of: impl Fn(&T) -> &String,
    label_of: impl Fn(&T) -> &String,
) -> GoalResult<String> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return Err(GoalError::validation(format!("{what} reference cannot be empty")));
    }

    if let Some(item) = items.iter().find(|&item| id_of(item) == identifier) {
        return Ok(id_of(item).clone());
    }

    if let Some(pos) = identifier.strip_prefix('#') {
        return pos
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|idx| items.get(idx))
            .map(|item| id_of(item).clone())
            .ok_or_else(|| GoalError::not_found(format!("no {what} at position {identifier}")));
    }

    let by_prefix: Vec<&T> = items
        .iter()
        .filter(|&item| id_of(item).starts_with(identifier))
        .collect();
    if by_prefix.len() == 1 {
        return Ok(id_of(by_prefix[0]).clone());
    }

    let wanted = identifier.to_lowercase();
    let by_label: Vec<&T> = items
        .iter()
        .filter(|&item| label_of(item).to_lowercase() == wanted)
        .collect();

    match (by_label.len(), by_prefix.len()) {
        (1, _) => Ok(id_of(by_label[0]).clone()),
        (0, 0) => Err(GoalError::not_found(format!("no {what} matches '{identifier}'"))),
        _ => {
            let candidates = if by_label.len() > 1 { by_label } else { by_prefix };
            let mut msg = format!("'{identifier}' matches several {what}s:");
            for item in candidates {
                msg.push_str(&format!("\n  {}  {}", short_id(id_of(item)), label_of(item)));
            }
            msg.push_str("\nUse a longer id prefix instead.");
            Err(GoalError::validation(msg))
        }
    }
}

/// First eight characters of an id, as shown in listings.
pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::DurationUnit;
    use crate::progress::{progress_percent, status_band, task_totals};
    use crate::fields::StatusBand;

    fn goal_input(title: &str) -> NewGoal {
        NewGoal {
            title: title.to_string(),
            description: None,
            duration_value: 10,
            duration_unit: DurationUnit::Days,
            end_date: NaiveDate::from_ymd_opt(2030, 6, 1),
            icon: None,
        }
    }

    fn store_total_tasks(store: &GoalStore) -> usize {
        store.goals().iter().map(|g| task_totals(g).total).sum()
    }

    #[test]
    fn concrete_progress_scenario() {
        let mut store = GoalStore::new();
        let g = store.create_goal(goal_input("Write a book")).unwrap();
        let p = store.add_period(&g, "Week 1", None).unwrap();
        let t = store.add_task(&g, &p, "Draft outline").unwrap();

        let toggle = store.toggle_task(&g, &p, &t).unwrap();
        assert!(toggle.became_completed);

        let goal = store.goal(&g).unwrap();
        let totals = task_totals(goal);
        assert_eq!((totals.total, totals.completed), (1, 1));
        assert_eq!(progress_percent(goal), 100);
        assert_eq!(status_band(progress_percent(goal)), StatusBand::Top);

        store.add_task(&g, &p, "Revise").unwrap();
        let goal = store.goal(&g).unwrap();
        let totals = task_totals(goal);
        assert_eq!((totals.total, totals.completed), (2, 1));
        assert_eq!(progress_percent(goal), 50);
        assert_eq!(status_band(progress_percent(goal)), StatusBand::High);
    }

    #[test]
    fn blank_title_is_rejected_without_mutation() {
        let mut store = GoalStore::new();
        store.create_goal(goal_input("Existing")).unwrap();
        let before = store.clone();

        let err = store.create_goal(goal_input("")).unwrap_err();
        assert!(matches!(err, GoalError::Validation(_)));
        assert_eq!(store.len(), 1);
        assert_eq!(store, before);
    }

    #[test]
    fn toggling_twice_restores_flag_and_progress() {
        let mut store = GoalStore::new();
        let g = store.create_goal(goal_input("Learn piano")).unwrap();
        let p = store.add_period(&g, "Month 1", None).unwrap();
        let t = store.add_task(&g, &p, "Scales").unwrap();
        store.add_task(&g, &p, "Chords").unwrap();
        let before = progress_percent(store.goal(&g).unwrap());

        let first = store.toggle_task(&g, &p, &t).unwrap();
        let second = store.toggle_task(&g, &p, &t).unwrap();
        assert!(first.completed && first.became_completed);
        assert!(!second.completed && !second.became_completed);
        assert!(!store.period(&g, &p).unwrap().task(&t).unwrap().completed);
        assert_eq!(progress_percent(store.goal(&g).unwrap()), before);
    }

    #[test]
    fn deleting_goal_cascades() {
        let mut store = GoalStore::new();
        let keep = store.create_goal(goal_input("Keep")).unwrap();
        let kp = store.add_period(&keep, "Q1", None).unwrap();
        store.add_task(&keep, &kp, "stay").unwrap();

        let doomed = store.create_goal(goal_input("Doomed")).unwrap();
        let mut nested = Vec::new();
        for name in ["A", "B"] {
            let p = store.add_period(&doomed, name, None).unwrap();
            for text in ["one", "two", "three"] {
                nested.push((p.clone(), store.add_task(&doomed, &p, text).unwrap()));
            }
        }

        let before = store_total_tasks(&store);
        let removed = store.delete_goal(&doomed).unwrap();
        assert_eq!(store_total_tasks(&store), before - task_totals(&removed).total);
        assert_eq!(store_total_tasks(&store), 1);

        assert!(store.goal(&doomed).is_none());
        for (p, t) in &nested {
            assert!(store.period(&doomed, p).is_none());
            assert!(store
                .goals()
                .iter()
                .flat_map(|g| &g.periods)
                .all(|period| &period.id != p && period.task(t).is_none()));
        }
    }

    #[test]
    fn deleting_period_cascades_to_tasks() {
        let mut store = GoalStore::new();
        let g = store.create_goal(goal_input("Garden")).unwrap();
        let p = store.add_period(&g, "Spring", None).unwrap();
        store.add_task(&g, &p, "Dig").unwrap();
        store.add_task(&g, &p, "Plant").unwrap();

        let removed = store.delete_period(&g, &p).unwrap();
        assert_eq!(removed.tasks.len(), 2);
        assert_eq!(task_totals(store.goal(&g).unwrap()).total, 0);
        assert_eq!(progress_percent(store.goal(&g).unwrap()), 0);
    }

    #[test]
    fn unknown_ids_report_not_found_uniformly() {
        let mut store = GoalStore::new();
        let g = store.create_goal(goal_input("Goal")).unwrap();
        let p = store.add_period(&g, "P", None).unwrap();
        let before = store.clone();

        assert!(matches!(store.delete_goal("missing"), Err(GoalError::NotFound(_))));
        assert!(matches!(store.add_period("missing", "P2", None), Err(GoalError::NotFound(_))));
        assert!(matches!(store.delete_period(&g, "missing"), Err(GoalError::NotFound(_))));
        assert!(matches!(store.add_task(&g, "missing", "x"), Err(GoalError::NotFound(_))));
        assert!(matches!(store.toggle_task(&g, &p, "missing"), Err(GoalError::NotFound(_))));
        assert!(matches!(store.delete_task(&g, &p, "missing"), Err(GoalError::NotFound(_))));
        assert_eq!(store, before);
    }

    #[test]
    fn blank_inputs_are_rejected_without_mutation() {
        let mut store = GoalStore::new();
        let g = store.create_goal(goal_input("Goal")).unwrap();
        let p = store.add_period(&g, "P", None).unwrap();
        let t = store.add_task(&g, &p, "T").unwrap();
        let before = store.clone();

        assert!(matches!(store.add_period(&g, "  ", None), Err(GoalError::Validation(_))));
        assert!(matches!(store.add_task(&g, &p, ""), Err(GoalError::Validation(_))));
        assert!(matches!(store.rename_goal(&g, " "), Err(GoalError::Validation(_))));
        assert!(matches!(store.rename_period(&g, &p, ""), Err(GoalError::Validation(_))));
        assert!(matches!(store.edit_task(&g, &p, &t, "\n"), Err(GoalError::Validation(_))));
        assert_eq!(store, before);
    }

    #[test]
    fn renames_and_deadlines_apply() {
        let mut store = GoalStore::new();
        let g = store.create_goal(goal_input("Goal")).unwrap();
        let p = store.add_period(&g, "P", None).unwrap();
        let t = store.add_task(&g, &p, "T").unwrap();
        let due = NaiveDate::from_ymd_opt(2030, 2, 1);

        store.rename_goal(&g, "Better goal").unwrap();
        store.rename_period(&g, &p, "Phase 1").unwrap();
        store.edit_task(&g, &p, &t, "Task one").unwrap();
        store.set_period_deadline(&g, &p, due).unwrap();

        let period = store.period(&g, &p).unwrap();
        assert_eq!(store.goal(&g).unwrap().title, "Better goal");
        assert_eq!(period.name, "Phase 1");
        assert_eq!(period.end_date, due);
        assert_eq!(period.task(&t).unwrap().text, "Task one");
    }

    #[test]
    fn tasks_keep_insertion_order() {
        let mut store = GoalStore::new();
        let g = store.create_goal(goal_input("Goal")).unwrap();
        let p = store.add_period(&g, "P", None).unwrap();
        for text in ["first", "second", "third"] {
            store.add_task(&g, &p, text).unwrap();
        }
        let texts: Vec<&str> = store.period(&g, &p).unwrap().tasks.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, ["first", "second", "third"]);
    }

    #[test]
    fn resolves_by_id_prefix_name_and_position() {
        let mut store = GoalStore::new();
        let a = store.create_goal(goal_input("Run")).unwrap();
        let b = store.create_goal(goal_input("Read")).unwrap();

        assert_eq!(store.resolve_goal(&a).unwrap(), a);
        assert_eq!(store.resolve_goal(&b[..12]).unwrap(), b);
        assert_eq!(store.resolve_goal("read").unwrap(), b);
        assert_eq!(store.resolve_goal("#1").unwrap(), a);
        assert!(matches!(store.resolve_goal("#3"), Err(GoalError::NotFound(_))));
        assert!(matches!(store.resolve_goal("Swim"), Err(GoalError::NotFound(_))));

        let p = store.add_period(&a, "Week 1", None).unwrap();
        let t = store.add_task(&a, &p, "Jog").unwrap();
        assert_eq!(store.resolve_period(&a, "week 1").unwrap(), p);
        assert_eq!(store.resolve_task(&a, &p, "#1").unwrap(), t);
    }

    #[test]
    fn duplicate_names_are_ambiguous() {
        let mut store = GoalStore::new();
        store.create_goal(goal_input("Same")).unwrap();
        store.create_goal(goal_input("same")).unwrap();
        assert!(matches!(store.resolve_goal("Same"), Err(GoalError::Validation(_))));
    }

    #[test]
    fn validate_accepts_stores_built_by_mutations() {
        let mut store = GoalStore::new();
        let g = store.create_goal(goal_input("Read more")).unwrap();
        let p = store.add_period(&g, "Week 1", None).unwrap();
        store.add_task(&g, &p, "Pick a book").unwrap();
        assert!(store.validate().is_ok());
        assert!(GoalStore::new().validate().is_ok());
    }

    #[test]
    fn validate_rejects_duplicate_ids() {
        let mut store = GoalStore::new();
        let g = store.create_goal(goal_input("Read more")).unwrap();
        let p = store.add_period(&g, "Week 1", None).unwrap();
        store.add_period(&g, "Week 2", None).unwrap();
        store.goals[0].periods[1].id = p.clone();
        assert!(matches!(store.validate(), Err(GoalError::Validation(msg)) if msg.contains("duplicate period")));

        store.goals[0].periods.pop();
        let t = store.add_task(&g, &p, "One").unwrap();
        store.add_task(&g, &p, "Two").unwrap();
        store.goals[0].periods[0].tasks[1].id = t;
        assert!(matches!(store.validate(), Err(GoalError::Validation(msg)) if msg.contains("duplicate task")));

        let mut store = GoalStore::new();
        store.create_goal(goal_input("A")).unwrap();
        let copy = store.goals[0].clone();
        store.goals.push(copy);
        assert!(matches!(store.validate(), Err(GoalError::Validation(msg)) if msg.contains("duplicate goal")));
    }

    #[test]
    fn validate_rejects_blank_fields_and_zero_duration() {
        let base = {
            let mut store = GoalStore::new();
            let g = store.create_goal(goal_input("Read more")).unwrap();
            let p = store.add_period(&g, "Week 1", None).unwrap();
            store.add_task(&g, &p, "Pick a book").unwrap();
            store
        };

        let mut store = base.clone();
        store.goals[0].title = "  ".into();
        assert!(matches!(store.validate(), Err(GoalError::Validation(_))));

        let mut store = base.clone();
        store.goals[0].duration = 0;
        assert!(matches!(store.validate(), Err(GoalError::Validation(_))));

        let mut store = base.clone();
        store.goals[0].periods[0].name.clear();
        assert!(matches!(store.validate(), Err(GoalError::Validation(_))));

        let mut store = base.clone();
        store.goals[0].periods[0].tasks[0].text = "\t".into();
        assert!(matches!(store.validate(), Err(GoalError::Validation(_))));

        let mut store = base;
        store.goals[0].id.clear();
        assert!(matches!(store.validate(), Err(GoalError::Validation(_))));
    }

    #[test]
    fn short_id_truncates() {
        assert_eq!(short_id("0123456789abcdef"), "01234567");
        assert_eq!(short_id("abc"), "abc");
    }
}
