//! Formula recalculation.
//!
//! Editing a cell recalculates it, then walks everything that transitively
//! names it. Each walk owns a [`RecalcPass`]: the set of cells whose
//! evaluation is in progress (used to spot cycles) and the set already
//! brought up to date, so a cell reached along several paths evaluates once.
//! A formula that reads a cell already marked circular in the same walk is
//! marked circular as well, whichever order the walk reached them in.
//! The pass lives on the caller's stack and is dropped when the walk ends,
//! so an early exit cannot leave a cell marked as in progress.

use super::state::{CellProperty, Spreadsheet};
use cellgrid_engine::engine::{
    Bindings, CELL_ERROR, CIRCULAR_REFERENCE_ERROR, CellInput, CellRef, ExpressionTree,
    ParseError, format_number, parse_number,
};
use log::{debug, trace};
use std::collections::{HashSet, VecDeque};
use std::rc::Rc;

/// A cell was reached again while its own evaluation was in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CircularReference;

#[derive(Debug, Default)]
pub(crate) struct RecalcPass {
    calculating: HashSet<CellRef>,
    settled: HashSet<CellRef>,
    circular: HashSet<CellRef>,
}

/// A formula waiting for the cells it names.
#[derive(Debug)]
struct PendingFormula {
    cell_ref: CellRef,
    tree: Rc<ExpressionTree>,
    names: Vec<(String, CellRef)>,
}

#[derive(Debug)]
enum Step {
    Enter(CellRef),
    Evaluate(PendingFormula),
}

impl Spreadsheet {
    /// Recalculate `origin` and every cell that depends on it, nearest first.
    pub(crate) fn recalculate_from(&mut self, origin: CellRef) {
        let mut pass = RecalcPass::default();
        if self.recalculate(origin, &mut pass).is_err() {
            debug!("{} is part of a circular reference", origin);
        }

        let mut queue = VecDeque::from([origin]);
        let mut seen = HashSet::from([origin]);
        while let Some(cell_ref) = queue.pop_front() {
            let Some(dependents) = self.dependents.get(&cell_ref) else {
                continue;
            };
            for dependent in dependents.clone() {
                if !seen.insert(dependent) {
                    continue;
                }
                if self.recalculate(dependent, &mut pass).is_err() {
                    debug!("{} is part of a circular reference", dependent);
                }
                queue.push_back(dependent);
            }
        }
    }

    /// Bring one cell up to date, recalculating the cells it names first.
    ///
    /// Referenced cells are visited depth first from an explicit stack, so
    /// the length of a reference chain is bounded by the grid, not by the
    /// thread's stack.
    fn recalculate(
        &mut self,
        origin: CellRef,
        pass: &mut RecalcPass,
    ) -> Result<(), CircularReference> {
        let mut stack = vec![Step::Enter(origin)];
        while let Some(step) = stack.pop() {
            match step {
                Step::Enter(cell_ref) => {
                    if pass.settled.contains(&cell_ref) {
                        // Reading a cell already known to be on a loop.
                        if pass.circular.contains(&cell_ref) && !pass.calculating.is_empty() {
                            return Err(self.abort_circular(cell_ref, pass));
                        }
                        continue;
                    }
                    let Some((pending, targets)) = self.prepare(cell_ref, pass) else {
                        continue;
                    };
                    if pass.calculating.contains(&cell_ref) {
                        return Err(self.abort_circular(cell_ref, pass));
                    }
                    pass.calculating.insert(cell_ref);
                    stack.push(Step::Evaluate(pending));
                    stack.extend(targets.into_iter().rev().map(Step::Enter));
                }
                Step::Evaluate(pending) => self.evaluate(pending, pass),
            }
        }
        Ok(())
    }

    /// Settle literals and broken formulas directly. A well-formed formula
    /// has its references linked and is returned with the cells it names.
    fn prepare(
        &mut self,
        cell_ref: CellRef,
        pass: &mut RecalcPass,
    ) -> Option<(PendingFormula, Vec<CellRef>)> {
        let cell = self.cell(&cell_ref)?;
        trace!("recalculating {}", cell_ref);

        let text = cell.text().to_string();
        let body = match CellInput::classify(&text) {
            CellInput::Literal(literal) => {
                self.unlink_references(cell_ref);
                self.set_result(cell_ref, literal.to_string(), None);
                pass.settled.insert(cell_ref);
                return None;
            }
            CellInput::Formula(body) => body,
        };

        let tree = match self.formula(cell_ref, body) {
            Ok(tree) => tree,
            Err(e) => {
                debug!("{}: cannot parse formula {:?}: {}", cell_ref, body, e);
                self.fail(cell_ref, CELL_ERROR, pass);
                return None;
            }
        };
        if tree.is_empty() {
            self.unlink_references(cell_ref);
            self.set_result(cell_ref, text.clone(), None);
            pass.settled.insert(cell_ref);
            return None;
        }

        let mut names = Vec::new();
        for name in tree.variables() {
            match self.resolve(name) {
                Some(target) => names.push((name.to_string(), target)),
                None => {
                    debug!("{}: invalid reference {:?}", cell_ref, name);
                    self.fail(cell_ref, CELL_ERROR, pass);
                    return None;
                }
            }
        }

        let mut targets: Vec<CellRef> = names.iter().map(|(_, target)| *target).collect();
        targets.sort();
        targets.dedup();
        self.link_references(cell_ref, &targets);

        Some((
            PendingFormula {
                cell_ref,
                tree,
                names,
            },
            targets,
        ))
    }

    /// Evaluate a formula whose references are all settled.
    fn evaluate(&mut self, pending: PendingFormula, pass: &mut RecalcPass) {
        let PendingFormula {
            cell_ref,
            tree,
            names,
        } = pending;
        let mut bindings = Bindings::new();
        for (name, target) in names {
            let value = self.cell(&target).map_or(0.0, |c| parse_number(c.value()));
            bindings.insert(name, value);
        }
        let result = tree.evaluate(&bindings);
        self.set_result(cell_ref, format_number(result), None);

        pass.calculating.remove(&cell_ref);
        pass.settled.insert(cell_ref);
    }

    /// Mark the loop through `cell_ref` and unwind the cells in progress.
    fn abort_circular(&mut self, cell_ref: CellRef, pass: &mut RecalcPass) -> CircularReference {
        self.mark_circular(cell_ref, pass);
        pass.calculating.clear();
        CircularReference
    }

    /// The cached tree for a cell's formula, parsing it on first use.
    fn formula(
        &mut self,
        cell_ref: CellRef,
        body: &str,
    ) -> Result<Rc<ExpressionTree>, ParseError> {
        if let Some(tree) = self.formulas.get(&cell_ref) {
            return Ok(Rc::clone(tree));
        }
        let tree = Rc::new(ExpressionTree::parse(body)?);
        self.formulas.insert(cell_ref, Rc::clone(&tree));
        Ok(tree)
    }

    /// Put a non-circular error on a cell. Its references are dropped so it
    /// is only recalculated again when its own text changes.
    fn fail(&mut self, cell_ref: CellRef, message: &str, pass: &mut RecalcPass) {
        self.unlink_references(cell_ref);
        self.set_result(cell_ref, message.to_string(), Some(message.to_string()));
        pass.settled.insert(cell_ref);
    }

    /// `cell_ref` and every cell whose evaluation is in progress get the
    /// circular reference error.
    fn mark_circular(&mut self, cell_ref: CellRef, pass: &mut RecalcPass) {
        let mut cycle: Vec<CellRef> = pass.calculating.iter().copied().collect();
        cycle.push(cell_ref);
        cycle.sort();
        cycle.dedup();
        debug!(
            "circular reference through {}",
            cycle
                .iter()
                .map(CellRef::name)
                .collect::<Vec<_>>()
                .join(", ")
        );
        for member in cycle {
            let message = CIRCULAR_REFERENCE_ERROR.to_string();
            self.set_result(member, message.clone(), Some(message));
            pass.settled.insert(member);
            pass.circular.insert(member);
        }
    }

    /// Store a value and error, notifying for each property that changed.
    fn set_result(&mut self, cell_ref: CellRef, value: String, error: Option<String>) {
        let Some(cell) = self.cell_mut(&cell_ref) else {
            return;
        };
        let value_changed = cell.set_value(value);
        let error_changed = cell.set_error(error);
        if value_changed {
            self.notify(cell_ref, CellProperty::Value);
        }
        if error_changed {
            self.notify(cell_ref, CellProperty::Error);
        }
    }

    /// Record that `cell_ref`'s formula names exactly `targets`.
    fn link_references(&mut self, cell_ref: CellRef, targets: &[CellRef]) {
        if self.references.get(&cell_ref).map(Vec::as_slice) == Some(targets) {
            return;
        }
        self.unlink_references(cell_ref);
        for target in targets {
            self.dependents.entry(*target).or_default().insert(cell_ref);
        }
        self.references.insert(cell_ref, targets.to_vec());
    }

    fn unlink_references(&mut self, cell_ref: CellRef) {
        let Some(old) = self.references.remove(&cell_ref) else {
            return;
        };
        for target in old {
            if let Some(set) = self.dependents.get_mut(&target) {
                set.remove(&cell_ref);
                if set.is_empty() {
                    self.dependents.remove(&target);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::state::CellChange;
    use std::cell::RefCell;

    fn r(name: &str) -> CellRef {
        CellRef::from_str(name).unwrap()
    }

    fn sheet_with(cells: &[(&str, &str)]) -> Spreadsheet {
        let mut sheet = Spreadsheet::new(50, 26);
        for (name, text) in cells {
            sheet.set_text(&r(name), text).unwrap();
        }
        sheet
    }

    fn value(sheet: &Spreadsheet, name: &str) -> String {
        sheet.cell(&r(name)).unwrap().value().to_string()
    }

    #[test]
    fn test_literal_text_is_value() {
        let sheet = sheet_with(&[("A1", "hello"), ("A2", "="), ("A3", "12")]);
        assert_eq!(value(&sheet, "A1"), "hello");
        assert_eq!(value(&sheet, "A2"), "=");
        assert_eq!(value(&sheet, "A3"), "12");
    }

    #[test]
    fn test_formula_with_constants() {
        let sheet = sheet_with(&[("A1", "=2+3*5"), ("A2", "=1/0"), ("A3", "=0/0")]);
        assert_eq!(value(&sheet, "A1"), "17");
        assert_eq!(value(&sheet, "A2"), "Infinity");
        assert_eq!(value(&sheet, "A3"), "NaN");
    }

    #[test]
    fn test_whitespace_formula_shows_text() {
        let sheet = sheet_with(&[("A1", "=   ")]);
        assert_eq!(value(&sheet, "A1"), "=   ");
        assert!(!sheet.cell(&r("A1")).unwrap().is_errored());
    }

    #[test]
    fn test_references_and_cascade() {
        let mut sheet = sheet_with(&[("A1", "5"), ("B1", "=A1+6"), ("C1", "=B1*2")]);
        assert_eq!(value(&sheet, "B1"), "11");
        assert_eq!(value(&sheet, "C1"), "22");

        sheet.set_text(&r("A1"), "1").unwrap();
        assert_eq!(value(&sheet, "B1"), "7");
        assert_eq!(value(&sheet, "C1"), "14");
    }

    #[test]
    fn test_empty_and_text_references_are_zero() {
        let sheet = sheet_with(&[("A1", "words"), ("B1", "=A1+C1+2")]);
        assert_eq!(value(&sheet, "B1"), "2");
    }

    #[test]
    fn test_lowercase_reference() {
        let sheet = sheet_with(&[("A1", "4"), ("B1", "=a1*2")]);
        assert_eq!(value(&sheet, "B1"), "8");
    }

    #[test]
    fn test_invalid_references_are_errors() {
        let sheet = sheet_with(&[("A1", "=ZZ1"), ("A2", "=A99+1"), ("A3", "=Hello")]);
        assert_eq!(value(&sheet, "A1"), CELL_ERROR);
        assert_eq!(value(&sheet, "A2"), CELL_ERROR);
        assert_eq!(value(&sheet, "A3"), CELL_ERROR);
    }

    #[test]
    fn test_parse_errors_are_cell_errors() {
        let sheet = sheet_with(&[("A1", "=(1+2"), ("A2", "=2^3"), ("A3", "=1+")]);
        for name in ["A1", "A2", "A3"] {
            let cell = sheet.cell(&r(name)).unwrap();
            assert_eq!(cell.error(), Some(CELL_ERROR), "{}", name);
            assert_eq!(cell.value(), CELL_ERROR);
        }
    }

    #[test]
    fn test_error_clears_when_fixed() {
        let mut sheet = sheet_with(&[("A1", "=ZZ1")]);
        sheet.set_text(&r("A1"), "=1+1").unwrap();
        assert_eq!(value(&sheet, "A1"), "2");
        assert!(!sheet.cell(&r("A1")).unwrap().is_errored());
    }

    #[test]
    fn test_self_reference_is_circular() {
        let sheet = sheet_with(&[("A1", "=A1+1")]);
        assert_eq!(value(&sheet, "A1"), CIRCULAR_REFERENCE_ERROR);
    }

    #[test]
    fn test_two_cell_cycle_marks_both() {
        let sheet = sheet_with(&[("A1", "=B1"), ("B1", "=A1")]);
        assert_eq!(value(&sheet, "A1"), CIRCULAR_REFERENCE_ERROR);
        assert_eq!(value(&sheet, "B1"), CIRCULAR_REFERENCE_ERROR);
    }

    #[test]
    fn test_breaking_cycle_clears_every_member() {
        let mut sheet = sheet_with(&[("A1", "=B1"), ("B1", "=A1")]);
        sheet.set_text(&r("B1"), "5").unwrap();
        assert_eq!(value(&sheet, "B1"), "5");
        assert_eq!(value(&sheet, "A1"), "5");
        assert!(!sheet.cell(&r("A1")).unwrap().is_errored());
    }

    #[test]
    fn test_four_cell_cycle() {
        let mut sheet = sheet_with(&[
            ("A1", "=B1"),
            ("B1", "=C1"),
            ("C1", "=D1"),
            ("D1", "=A1"),
        ]);
        for name in ["A1", "B1", "C1", "D1"] {
            assert_eq!(value(&sheet, name), CIRCULAR_REFERENCE_ERROR, "{}", name);
        }

        sheet.set_text(&r("C1"), "3").unwrap();
        assert_eq!(value(&sheet, "A1"), "3");
        assert_eq!(value(&sheet, "B1"), "3");
        assert_eq!(value(&sheet, "C1"), "3");
        assert_eq!(value(&sheet, "D1"), "3");
    }

    #[test]
    fn test_cell_leading_into_cycle_is_marked() {
        let sheet = sheet_with(&[("B1", "=C1"), ("C1", "=B1"), ("A1", "=B1+1")]);
        assert_eq!(value(&sheet, "A1"), CIRCULAR_REFERENCE_ERROR);
    }

    #[test]
    fn test_reader_of_cycle_ignores_edit_order() {
        let loop_first = sheet_with(&[("A1", "=B1"), ("B1", "=A1"), ("D1", "=A1")]);
        let reader_first = sheet_with(&[("D1", "=A1"), ("A1", "=B1"), ("B1", "=A1")]);
        assert_eq!(value(&loop_first, "D1"), CIRCULAR_REFERENCE_ERROR);
        assert_eq!(value(&reader_first, "D1"), value(&loop_first, "D1"));

        let mut sheet = reader_first;
        sheet.set_text(&r("E1"), "=D1+1").unwrap();
        sheet.set_text(&r("B1"), "5").unwrap();
        assert_eq!(value(&sheet, "D1"), "5");
        assert_eq!(value(&sheet, "E1"), "6");
        assert!(sheet.cells().all(|c| !c.is_errored()));
    }

    #[test]
    fn test_chain_across_whole_grid() {
        let mut sheet = Spreadsheet::new(50, 26);
        let mut previous: Option<CellRef> = None;
        for row in 0..50 {
            for col in 0..26 {
                let cell_ref = CellRef::at(row, col);
                let text = match previous {
                    Some(prev) => format!("={}+1", prev),
                    None => "1".to_string(),
                };
                sheet.set_text(&cell_ref, &text).unwrap();
                previous = Some(cell_ref);
            }
        }
        assert_eq!(value(&sheet, "Z50"), "1300");

        sheet.set_text(&r("A1"), "=Z50").unwrap();
        assert_eq!(value(&sheet, "A1"), CIRCULAR_REFERENCE_ERROR);
        assert_eq!(value(&sheet, "M25"), CIRCULAR_REFERENCE_ERROR);

        sheet.set_text(&r("A1"), "0").unwrap();
        assert_eq!(value(&sheet, "Z50"), "1299");
    }

    #[test]
    fn test_no_false_positive_after_cycle() {
        let mut sheet = sheet_with(&[("A1", "=B1"), ("B1", "=A1")]);
        sheet.set_text(&r("A1"), "2").unwrap();
        sheet.set_text(&r("C1"), "=A1+B1").unwrap();
        sheet.set_text(&r("D1"), "=C1*C1").unwrap();
        assert_eq!(value(&sheet, "C1"), "4");
        assert_eq!(value(&sheet, "D1"), "16");
        assert!(sheet.cells().all(|c| !c.is_errored()));
    }

    #[test]
    fn test_diamond_evaluates_consistently() {
        let mut sheet = sheet_with(&[
            ("A1", "1"),
            ("B1", "=A1*10"),
            ("C1", "=A1+B1"),
            ("D1", "=B1+C1"),
        ]);
        assert_eq!(value(&sheet, "D1"), "21");
        sheet.set_text(&r("A1"), "2").unwrap();
        assert_eq!(value(&sheet, "C1"), "22");
        assert_eq!(value(&sheet, "D1"), "42");
    }

    #[test]
    fn test_reference_graph_follows_edits() {
        let mut sheet = sheet_with(&[("A1", "1"), ("B1", "=A1+A1")]);
        assert_eq!(sheet.references.get(&r("B1")), Some(&vec![r("A1")]));
        assert!(sheet.dependents[&r("A1")].contains(&r("B1")));

        sheet.set_text(&r("B1"), "plain").unwrap();
        assert!(!sheet.references.contains_key(&r("B1")));
        assert!(!sheet.dependents.contains_key(&r("A1")));

        // A1 no longer feeds B1.
        sheet.set_text(&r("A1"), "7").unwrap();
        assert_eq!(value(&sheet, "B1"), "plain");
    }

    #[test]
    fn test_round_trip_formatting_of_results() {
        let sheet = sheet_with(&[("A1", "4.3"), ("A2", "=A1*2")]);
        assert_eq!(value(&sheet, "A2"), "8.6");
        let sheet = sheet_with(&[("A1", "=0.1+0.2")]);
        assert_eq!(value(&sheet, "A1"), "0.30000000000000004");
    }

    #[test]
    fn test_formula_cache_dropped_on_edit() {
        let mut sheet = sheet_with(&[("A1", "=1+1")]);
        assert!(sheet.formulas.contains_key(&r("A1")));
        sheet.set_text(&r("A1"), "=2*3").unwrap();
        assert_eq!(value(&sheet, "A1"), "6");
    }

    #[test]
    fn test_value_notifications_cascade() {
        let mut sheet = sheet_with(&[("A1", "1"), ("B1", "=A1")]);
        let seen: Rc<RefCell<Vec<CellChange>>> = Rc::default();
        let sink = Rc::clone(&seen);
        sheet.subscribe(move |change| sink.borrow_mut().push(*change));

        sheet.set_text(&r("A1"), "2").unwrap();
        let seen = seen.borrow();
        assert!(seen.contains(&CellChange {
            cell: r("A1"),
            property: CellProperty::Text
        }));
        assert!(seen.contains(&CellChange {
            cell: r("B1"),
            property: CellProperty::Value
        }));
        assert!(!seen.iter().any(|c| c.property == CellProperty::Error));
    }
}
