//! Host-service builtins: terminal size, CPU time, version and exit

use super::arity;
use benzl_core::env::Env;
use benzl_core::interp::Interp;
use benzl_core::value::{ErrKind, Kind, Value, to_display_string};
use std::rc::Rc;

/// `(console-size)` => `{cols rows}`
pub fn console_size(_interp: &mut Interp, _env: &Env, _args: &Rc<Value>) -> Rc<Value> {
    let (cols, rows) = terminal_size();
    Value::qexpr(vec![Value::int(cols), Value::int(rows)])
}

#[cfg(unix)]
fn terminal_size() -> (i64, i64) {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let r = unsafe { libc::ioctl(libc::STDIN_FILENO, libc::TIOCGWINSZ, &mut ws) };
    if r == 0 && ws.ws_col > 0 && ws.ws_row > 0 {
        (i64::from(ws.ws_col), i64::from(ws.ws_row))
    } else {
        (80, 25)
    }
}

#[cfg(not(unix))]
fn terminal_size() -> (i64, i64) {
    (80, 25)
}

/// `(cpu-time-since start)` => milliseconds of CPU time since `start`
/// (pass `0` for the total so far).
pub fn cpu_time_since(interp: &mut Interp, _env: &Env, args: &Rc<Value>) -> Rc<Value> {
    arity!(interp, "cpu-time-since", args, 1);
    let v = &args.children()[0];
    let since = match v.kind {
        Kind::Int(x) => x as f64,
        Kind::Float(x) => x,
        _ => {
            return interp.error_at(
                ErrKind::Type,
                args,
                format!(
                    "cpu-time-since expects a single numeric argument - got '{}'",
                    v.type_name()
                ),
            );
        }
    };
    Value::float(cpu_time_ms() - since)
}

#[cfg(unix)]
fn cpu_time_ms() -> f64 {
    let mut ts = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    let r = unsafe { libc::clock_gettime(libc::CLOCK_PROCESS_CPUTIME_ID, &mut ts) };
    if r != 0 {
        return 0.0;
    }
    ts.tv_sec as f64 * 1000.0 + ts.tv_nsec as f64 / 1_000_000.0
}

#[cfg(not(unix))]
fn cpu_time_ms() -> f64 {
    use std::sync::OnceLock;
    use std::time::Instant;
    static START: OnceLock<Instant> = OnceLock::new();
    START.get_or_init(Instant::now).elapsed().as_secs_f64() * 1000.0
}

/// `(exit 0)` ends the process with the given status.
pub fn exit(_interp: &mut Interp, _env: &Env, args: &Rc<Value>) -> Rc<Value> {
    let code = match args.children().first().map(|c| &c.kind) {
        Some(Kind::Int(x)) => *x as i32,
        Some(_) => 1,
        None => 0,
    };
    std::process::exit(code);
}

/// `(version)` prints the interpreter banner.
pub fn version(_interp: &mut Interp, _env: &Env, _args: &Rc<Value>) -> Rc<Value> {
    println!(
        "--\nbenzl v{}\nMade by Ben Copsey, based on a design by Daniel Holden\n\
         https://github.com/pokeb/benzl\n--",
        env!("CARGO_PKG_VERSION")
    );
    Value::empty_sexpr()
}

/// `(print-env)` dumps every binding in the environment chain.
pub fn print_env(_interp: &mut Interp, env: &Env, _args: &Rc<Value>) -> Rc<Value> {
    let mut scope = Some(env.clone());
    let mut label = "Env:";
    while let Some(e) = scope {
        println!("{}", label);
        for (key, value) in e.table().borrow().entries() {
            println!("{}: {}", key.name, to_display_string(&value, true));
        }
        label = "Parent:";
        scope = e.parent();
    }
    Value::empty_sexpr()
}
