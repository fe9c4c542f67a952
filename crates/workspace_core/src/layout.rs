//! Deterministic canvas placement.

use shared::domain::{Position, ProcessGroupView, ProcessorView};

use crate::settings::LayoutSettings;

#[derive(Debug, Clone, Default)]
pub struct CanvasLayout {
    settings: LayoutSettings,
}

impl CanvasLayout {
    pub fn new(settings: LayoutSettings) -> Self {
        Self { settings }
    }

    fn group_slot(&self, n: usize) -> Position {
        let n = n as f64;
        Position::new(
            self.settings.group_base.x + n * self.settings.group_delta.x,
            self.settings.group_base.y + n * self.settings.group_delta.y,
        )
    }

    /// Position for a new process group. Starts at the slot for the current
    /// sibling count and steps forward past any slot a sibling occupies.
    pub fn new_group_position(&self, siblings: &[Position]) -> Position {
        let start = siblings.len();
        // `siblings` can block at most `start` slots, so one of these is free
        // unless the delta is zero.
        (start..=start * 2)
            .map(|n| self.group_slot(n))
            .find(|candidate| !siblings.contains(candidate))
            .unwrap_or_else(|| self.group_slot(start))
    }

    pub fn processor_position(&self, index: usize) -> Position {
        let step = self.settings.processor_width + self.settings.processor_gap;
        Position::new(
            self.settings.processor_start.x + index as f64 * step,
            self.settings.processor_start.y,
        )
    }

    /// Lays processors out side by side in ascending id order. Arrival
    /// order from the server is ignored, so the result only depends on the
    /// set of ids.
    pub fn layout_processors(&self, mut processors: Vec<ProcessorView>) -> Vec<ProcessorView> {
        processors.sort_by(|a, b| a.id().cmp(b.id()));
        for (index, processor) in processors.iter_mut().enumerate() {
            processor.summary.position = self.processor_position(index);
        }
        processors
    }

    pub fn correct_off_canvas(&self, position: Position) -> Position {
        if position.x > self.settings.off_canvas_x_threshold {
            self.settings.visible_default
        } else {
            position
        }
    }

    pub fn place_groups(&self, mut groups: Vec<ProcessGroupView>) -> Vec<ProcessGroupView> {
        for group in &mut groups {
            group.position = self.correct_off_canvas(group.position);
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use shared::domain::ComponentId;

    use super::*;

    fn processor(id: &str) -> ProcessorView {
        let mut view = ProcessorView::default();
        view.summary.id = ComponentId::from(id);
        view.is_processor = true;
        view
    }

    #[test]
    fn new_groups_never_share_a_position_within_a_session() {
        let layout = CanvasLayout::default();
        let mut seen = Vec::new();
        for n in 0..25 {
            let position = layout.new_group_position(&seen);
            assert!(
                seen.iter().all(|existing| *existing != position),
                "position {position:?} reused at n={n}"
            );
            seen.push(position);
        }
        assert_eq!(layout.new_group_position(&[]), Position::new(100.0, 100.0));
        assert_eq!(seen[3], Position::new(250.0, 250.0));
    }

    #[test]
    fn new_group_skips_slots_taken_by_siblings() {
        let layout = CanvasLayout::default();
        // One sibling already sits on slot 1, where a count-based pick would land.
        let siblings = [Position::new(150.0, 150.0)];
        assert_eq!(layout.new_group_position(&siblings), Position::new(200.0, 200.0));

        // A gap left by a delete is not reused when a later slot is free.
        let siblings = [Position::new(100.0, 100.0), Position::new(200.0, 200.0)];
        let position = layout.new_group_position(&siblings);
        assert!(!siblings.contains(&position));
        assert_eq!(position, Position::new(250.0, 250.0));
    }

    #[test]
    fn processors_are_ordered_by_id_not_arrival() {
        let layout = CanvasLayout::default();
        let laid_out = layout.layout_processors(vec![processor("c"), processor("a"), processor("b")]);
        let ids: Vec<_> = laid_out.iter().map(|p| p.id().as_str().to_string()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(laid_out[0].summary.position, Position::new(100.0, 100.0));
        assert_eq!(laid_out[1].summary.position, Position::new(500.0, 100.0));
        assert_eq!(laid_out[2].summary.position, Position::new(900.0, 100.0));
    }

    #[test]
    fn processor_layout_is_idempotent_over_permutations() {
        let layout = CanvasLayout::default();
        let first = layout.layout_processors(vec![processor("p2"), processor("p10"), processor("p1")]);
        let second = layout.layout_processors(vec![processor("p1"), processor("p2"), processor("p10")]);
        assert_eq!(first, second);
        assert_eq!(layout.layout_processors(first.clone()), first);
    }

    #[test]
    fn off_canvas_positions_are_replaced() {
        let layout = CanvasLayout::default();
        assert_eq!(
            layout.correct_off_canvas(Position::new(2500.0, 40.0)),
            Position::new(100.0, 100.0)
        );
        assert_eq!(
            layout.correct_off_canvas(Position::new(2000.0, 40.0)),
            Position::new(2000.0, 40.0)
        );
        // Only x is checked.
        assert_eq!(
            layout.correct_off_canvas(Position::new(10.0, 9000.0)),
            Position::new(10.0, 9000.0)
        );
    }
}
