use scrywind::{
    arch::mips::{encode::*, Mips},
    view::{self, FrameRow},
    EngineConfig, MappedMemory, MemoryView, RegisterSnapshot, SymbolTable,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const MAIN: u32 = 0x0010_0000;
const HELPER: u32 = 0x0010_0024;
const STACK_TOP: u32 = 0x0020_0000;

/// A small program: `main` calls `helper`, whatever called `main` is not
/// loaded.
fn load_program() -> MappedMemory {
    let mut memory = MappedMemory::new();
    memory.map(
        MAIN - 8,
        vec![
            jr_ra(),
            NOP,
            // main
            addiu_sp(-32),
            sw_ra(28),
            NOP,
            jal(HELPER),
            NOP,
            NOP,
            lw_ra(28),
            jr_ra(),
            addiu_sp(32),
            // helper
            addiu_sp(-16),
            sw_ra(12),
            NOP,
            NOP,
            lw_ra(12),
            jr_ra(),
            addiu_sp(16),
        ],
    );
    memory.map(STACK_TOP - 0x40, vec![0; 16]);
    memory
}

/// Stands in for the debugger's call stack window: recomputes its rows every
/// time it is told the machine changed.
struct CallStackWindow {
    config: EngineConfig,
    symbols: SymbolTable,
    rows: Vec<FrameRow>,
}

impl CallStackWindow {
    fn on_machine_state_change(&mut self, snapshot: &RegisterSnapshot, memory: &impl MemoryView) {
        let stack = scrywind::unwind(snapshot, memory, &Mips, &self.config);
        info!(termination = %stack.termination(), "call stack updated");
        self.rows = view::rows(&stack, &self.symbols);
    }

    fn print(&self) {
        for row in &self.rows {
            info!("{:<24} {}", row.function, row.caller);
        }
    }

    /// What a double click on row `index` would navigate to.
    fn activate(&self, index: usize) -> Option<u32> {
        self.rows.get(index)?.target
    }
}

fn config_from_env() -> EngineConfig {
    let read = |name: &str| std::env::var(name).ok().and_then(|v| v.parse().ok());
    let default = EngineConfig::default();
    match EngineConfig::new(
        read("SCRYWIND_MAX_SCAN_DISTANCE").unwrap_or(default.max_scan_distance()),
        read("SCRYWIND_MAX_FRAME_DEPTH")
            .map(|v: u32| v as usize)
            .unwrap_or(default.max_frame_depth()),
    ) {
        Ok(config) => config,
        Err(err) => {
            warn!("{err}, using defaults");
            default
        }
    }
}

fn main() {
    let registry = tracing_subscriber::Registry::default().with(
        EnvFilter::builder()
            .with_default_directive(tracing::Level::INFO.into())
            .from_env()
            .unwrap(),
    );

    let tree_layer = tracing_tree::HierarchicalLayer::new(2)
        .with_targets(true)
        .with_bracketed_fields(true);

    registry.with(tree_layer).init();

    let mut memory = load_program();
    let mut window = CallStackWindow {
        config: config_from_env(),
        symbols: [(MAIN, "main"), (HELPER, "helper")].into_iter().collect(),
        rows: Vec::new(),
    };

    // Paused in main before it stored ra: the link register is all we have.
    let main_sp = STACK_TOP - 32;
    window.on_machine_state_change(&RegisterSnapshot::new(MAIN + 4, main_sp, 0x0040_0000), &memory);
    window.print();

    // Paused inside helper.
    let helper_sp = main_sp - 16;
    memory.write32(main_sp + 28, 0x0040_0000).unwrap();
    memory.write32(helper_sp + 12, MAIN + 0x14).unwrap();
    window.on_machine_state_change(
        &RegisterSnapshot::new(HELPER + 12, helper_sp, MAIN + 0x14),
        &memory,
    );
    window.print();
    if let Some(target) = window.activate(1) {
        info!("double click on the second row goes to {target:#010x}");
    }

    // Somewhere we know nothing about.
    window.on_machine_state_change(&RegisterSnapshot::new(0x0080_0000, STACK_TOP, 0), &memory);
    window.print();
}
