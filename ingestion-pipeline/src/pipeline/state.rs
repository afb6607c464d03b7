use state_machines::state_machine;

state_machine! {
    name: IngestionMachine,
    state: IngestionState,
    initial: Ready,
    states: [Ready, Parsed, Normalized, Filtered, IndexEnsured, Submitted, Converged, Failed],
    events {
        parse { transition: { from: Ready, to: Parsed } }
        normalize { transition: { from: Parsed, to: Normalized } }
        filter { transition: { from: Normalized, to: Filtered } }
        ensure { transition: { from: Filtered, to: IndexEnsured } }
        submit { transition: { from: IndexEnsured, to: Submitted } }
        converge { transition: { from: Submitted, to: Converged } }
        abort {
            transition: { from: Ready, to: Failed }
            transition: { from: Parsed, to: Failed }
            transition: { from: Normalized, to: Failed }
            transition: { from: Filtered, to: Failed }
            transition: { from: IndexEnsured, to: Failed }
            transition: { from: Submitted, to: Failed }
            transition: { from: Converged, to: Failed }
        }
    }
}

pub fn ready() -> IngestionMachine<(), Ready> {
    IngestionMachine::new(())
}
