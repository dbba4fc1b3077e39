mod intent;
mod system;

pub use intent::{classify_intent, pick_mode, Intent, CONFIDENCE_THRESHOLD};
pub use system::{
    build_sys_for_mode, system_prompt_for, SYS_BRIEF, SYS_COMMON, SYS_DRAFT, SYS_LAWFINDER,
    SYS_MEMO, SYS_QUICK,
};
