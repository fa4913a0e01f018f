use rust_fsm::*;

state_machine! {
    drag_flow(Idle)

    Idle(HydrateDragging) => Dragging,
    Idle(HydrateDropped) => Dropped,

    Idle(Grab) => Dragging,

    Dragging(Drop) => Dropped,
    Dragging(Cancel) => Idle,

    Dropped(Settle) => Idle
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragState {
    Idle,
    Dragging,
    Dropped,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragEvent {
    Grab,
    Drop,
    Cancel,
    Settle,
}

fn hydrate(machine: &mut drag_flow::StateMachine, state: DragState) -> Result<(), ()> {
    let input = match state {
        DragState::Idle => return Ok(()),
        DragState::Dragging => drag_flow::Input::HydrateDragging,
        DragState::Dropped => drag_flow::Input::HydrateDropped,
    };
    machine.consume(&input).map_err(|_| ())?;
    Ok(())
}

fn expected_next_state(current: DragState, event: DragEvent) -> Option<DragState> {
    match (current, event) {
        (DragState::Idle, DragEvent::Grab) => Some(DragState::Dragging),
        (DragState::Dragging, DragEvent::Drop) => Some(DragState::Dropped),
        (DragState::Dragging, DragEvent::Cancel) => Some(DragState::Idle),
        (DragState::Dropped, DragEvent::Settle) => Some(DragState::Idle),
        _ => None,
    }
}

pub fn transition(current: DragState, event: DragEvent) -> Option<DragState> {
    let mut machine = drag_flow::StateMachine::new();
    hydrate(&mut machine, current).ok()?;

    let input = match event {
        DragEvent::Grab => drag_flow::Input::Grab,
        DragEvent::Drop => drag_flow::Input::Drop,
        DragEvent::Cancel => drag_flow::Input::Cancel,
        DragEvent::Settle => drag_flow::Input::Settle,
    };

    machine.consume(&input).ok()?;
    expected_next_state(current, event)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drag_fsm_allows_full_gesture() {
        assert_eq!(
            transition(DragState::Idle, DragEvent::Grab),
            Some(DragState::Dragging)
        );
        assert_eq!(
            transition(DragState::Dragging, DragEvent::Drop),
            Some(DragState::Dropped)
        );
        assert_eq!(
            transition(DragState::Dropped, DragEvent::Settle),
            Some(DragState::Idle)
        );
    }

    #[test]
    fn drag_fsm_allows_cancellation() {
        assert_eq!(
            transition(DragState::Dragging, DragEvent::Cancel),
            Some(DragState::Idle)
        );
    }

    #[test]
    fn drag_fsm_rejects_invalid_transitions() {
        assert_eq!(transition(DragState::Idle, DragEvent::Drop), None);
        assert_eq!(transition(DragState::Idle, DragEvent::Cancel), None);
        assert_eq!(transition(DragState::Dragging, DragEvent::Grab), None);
        assert_eq!(transition(DragState::Dropped, DragEvent::Drop), None);
    }
}
