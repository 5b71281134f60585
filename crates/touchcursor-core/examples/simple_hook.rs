#[cfg(windows)]
fn main() -> anyhow::Result<()> {
    use std::sync::Arc;
    use touchcursor_core::keyboard_hook::{self, SendInputSink};
    use touchcursor_core::{Configuration, Engine, Interceptor, Notification};

    tracing_subscriber::fmt::init();

    println!("Starting TouchCursor hook...");
    println!("Hold Space and press I/J/K/L for arrows. Alt+Space latches the layer.");

    let interceptor = Arc::new(Interceptor::new(
        Engine::new(Configuration::default()),
        SendInputSink,
    ));

    let rx = interceptor.subscribe();
    std::thread::spawn(move || {
        for notification in rx {
            match notification {
                Notification::ActivationStateChanged { key, active } => {
                    println!("{} layer {}", key, if active { "on" } else { "off" })
                }
                Notification::EnabledChanged { enabled } => println!("remapping enabled={}", enabled),
                Notification::Cue(cue) => println!("cue: {:?}", cue),
                Notification::ActivationAttempt { .. } => {}
            }
        }
    });

    let _hook = keyboard_hook::install_hook(Arc::clone(&interceptor))?;
    keyboard_hook::run_event_loop()?;

    Ok(())
}

#[cfg(not(windows))]
fn main() {
    println!("simple_hook needs a Windows low-level keyboard hook; nothing to do here.");
}
