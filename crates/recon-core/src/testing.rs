//! Runner guionado para tests: registra cada invocación y devuelve códigos
//! de salida programados por programa, sin lanzar procesos.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::io;

use crate::environ::EnvironmentSnapshot;
use crate::process::{ProcessExit, ProcessRunner};

type Effect = Box<dyn Fn(&[String]) -> io::Result<()>>;

#[derive(Default)]
pub struct ScriptedRunner {
    calls: RefCell<Vec<Vec<String>>>,
    exits: RefCell<HashMap<String, VecDeque<Option<i32>>>>,
    launch_failures: RefCell<HashMap<String, String>>,
    effects: HashMap<String, Effect>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encola códigos de salida para `program`; agotada la cola, sale con 0.
    pub fn exits(self, program: &str, codes: &[i32]) -> Self {
        self.exits.borrow_mut().entry(program.to_string()).or_default().extend(codes.iter().map(|c| Some(*c)));
        self
    }

    /// El programa termina por señal (sin código).
    pub fn killed(self, program: &str) -> Self {
        self.exits.borrow_mut().entry(program.to_string()).or_default().push_back(None);
        self
    }

    /// El programa no puede lanzarse.
    pub fn fails_to_launch(self, program: &str, reason: &str) -> Self {
        self.launch_failures.borrow_mut().insert(program.to_string(), reason.to_string());
        self
    }

    /// Efecto sobre el disco que simula la salida del programa.
    pub fn on(mut self, program: &str, effect: impl Fn(&[String]) -> io::Result<()> + 'static) -> Self {
        self.effects.insert(program.to_string(), Box::new(effect));
        self
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.borrow().clone()
    }

    pub fn calls_for(&self, program: &str) -> Vec<Vec<String>> {
        self.calls.borrow().iter().filter(|c| c.first().map(String::as_str) == Some(program)).cloned().collect()
    }
}

impl ProcessRunner for ScriptedRunner {
    fn run(&self, argv: &[String], _env: &EnvironmentSnapshot) -> io::Result<ProcessExit> {
        self.calls.borrow_mut().push(argv.to_vec());
        let program = argv.first().cloned().unwrap_or_default();
        if let Some(reason) = self.launch_failures.borrow().get(&program) {
            return Err(io::Error::new(io::ErrorKind::NotFound, reason.clone()));
        }
        if let Some(effect) = self.effects.get(&program) {
            effect(argv)?;
        }
        let code = self.exits.borrow_mut().get_mut(&program).and_then(VecDeque::pop_front).unwrap_or(Some(0));
        Ok(ProcessExit { code })
    }
}
