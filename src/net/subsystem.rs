use once_cell::sync::OnceCell;

/// Process-wide network subsystem handle.
///
/// Socket APIs that need global startup (Winsock's WSAStartup) hook it
/// here; the BSD provider has nothing to start, so acquisition is a no-op
/// beyond the one-time initialization bookkeeping. The singleton lives for
/// the rest of the process.
pub struct NetworkSubsystem {
    _priv: (),
}

static SUBSYSTEM: OnceCell<NetworkSubsystem> = OnceCell::new();

impl NetworkSubsystem {
    /// Acquires the subsystem, initializing it on first use. Every socket
    /// constructor calls this before touching the native API.
    pub fn acquire() -> &'static NetworkSubsystem {
        SUBSYSTEM.get_or_init(|| {
            info!("strictnet: network subsystem initialized");
            NetworkSubsystem { _priv: () }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_returns_the_same_instance() {
        let first: *const NetworkSubsystem = NetworkSubsystem::acquire();
        let second: *const NetworkSubsystem = NetworkSubsystem::acquire();
        assert_eq!(first, second);
    }
}
