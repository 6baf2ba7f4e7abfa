use super::constraint::{BoolVar, Constraint};
use super::encoder::{Clause, CnfEncoder};
use super::engine::{CheckResult, SatEngine, SolverError};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, trace, warn};
use varisat::{ExtendFormula, Lit, Solver};

enum Request {
    AddClauses(Vec<Clause>),
    Solve,
}

enum Reply {
    Sat(Vec<bool>),
    Unsat,
    Failed(String),
}

struct Worker {
    requests: Sender<Request>,
    replies: Receiver<Reply>,
    handle: JoinHandle<()>,
}

/// [`SatEngine`] backed by the incremental CDCL solver from the `varisat` crate.
///
/// The solver lives on its own thread so that a check can be abandoned when its time limit
/// expires. An abandoned solver is never resumed: every later check reports
/// [`CheckResult::Unknown`].
///
/// `varisat` cannot interrupt a running search. After abandonment the worker keeps one core
/// busy until that search returns, then sees its reply channel closed and exits without
/// accepting more work. Dropping the engine never waits on an abandoned worker.
pub struct VarisatEngine {
    encoder: CnfEncoder,
    names: Vec<String>,
    timeout: Option<Duration>,
    model: Option<Vec<bool>>,
    worker: Option<Worker>,
}

impl VarisatEngine {
    pub fn new() -> Result<Self, SolverError> {
        let (request_tx, request_rx) = mpsc::channel::<Request>();
        let (reply_tx, reply_rx) = mpsc::channel::<Reply>();

        let handle = thread::Builder::new()
            .name("needler-sat".to_string())
            .spawn(move || serve(request_rx, reply_tx))
            .map_err(|e| SolverError::Backend(format!("failed to start solver thread: {e}")))?;

        Ok(Self {
            encoder: CnfEncoder::new(),
            names: Vec::new(),
            timeout: None,
            model: None,
            worker: Some(Worker {
                requests: request_tx,
                replies: reply_rx,
                handle,
            }),
        })
    }

    /// Name given to `var` when it was declared.
    pub fn name(&self, var: BoolVar) -> Option<&str> {
        self.names.get(var.index()).map(String::as_str)
    }

    pub fn is_abandoned(&self) -> bool {
        self.worker.is_none()
    }

    /// Detaches the worker. Its request and reply channels close here, so the thread exits as
    /// soon as the search in flight returns.
    fn abandon(&mut self) {
        if let Some(worker) = self.worker.take() {
            warn!(
                thread = ?worker.handle.thread().name(),
                "Abandoning SAT worker after time limit; later checks report unknown"
            );
        }
    }
}

fn serve(requests: Receiver<Request>, replies: Sender<Reply>) {
    let mut solver = Solver::new();
    for request in requests {
        match request {
            Request::AddClauses(clauses) => {
                for clause in clauses {
                    let lits: Vec<Lit> = clause
                        .iter()
                        .map(|&l| Lit::from_dimacs(l as isize))
                        .collect();
                    solver.add_clause(&lits);
                }
            }
            Request::Solve => {
                let reply = match solver.solve() {
                    Ok(true) => match solver.model() {
                        Some(model) => {
                            let len = model.iter().map(|l| l.var().index() + 1).max().unwrap_or(0);
                            let mut values = vec![false; len];
                            for lit in model {
                                values[lit.var().index()] = lit.is_positive();
                            }
                            Reply::Sat(values)
                        }
                        None => Reply::Failed("solver reported SAT without a model".to_string()),
                    },
                    Ok(false) => Reply::Unsat,
                    Err(e) => Reply::Failed(format!("{e:?}")),
                };
                if replies.send(reply).is_err() {
                    break;
                }
            }
        }
    }
}

impl SatEngine for VarisatEngine {
    fn declare_bool(&mut self, name: &str) -> BoolVar {
        self.names.push(name.to_string());
        self.encoder.declare()
    }

    fn add(&mut self, constraint: Constraint) -> Result<(), SolverError> {
        self.encoder.assert(&constraint)
    }

    fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }

    fn check(&mut self) -> Result<CheckResult, SolverError> {
        self.model = None;
        let clauses = self.encoder.take_clauses();

        let Some(worker) = self.worker.as_ref() else {
            return Ok(CheckResult::Unknown);
        };
        debug!(
            new_clauses = clauses.len(),
            variables = self.encoder.num_vars(),
            "Submitting check to SAT worker"
        );
        if !clauses.is_empty() {
            worker
                .requests
                .send(Request::AddClauses(clauses))
                .map_err(|_| SolverError::Disconnected)?;
        }
        worker
            .requests
            .send(Request::Solve)
            .map_err(|_| SolverError::Disconnected)?;

        let reply = match self.timeout {
            Some(limit) => match worker.replies.recv_timeout(limit) {
                Ok(reply) => reply,
                Err(RecvTimeoutError::Timeout) => {
                    self.abandon();
                    return Ok(CheckResult::Unknown);
                }
                Err(RecvTimeoutError::Disconnected) => return Err(SolverError::Disconnected),
            },
            None => worker
                .replies
                .recv()
                .map_err(|_| SolverError::Disconnected)?,
        };

        match reply {
            Reply::Sat(mut values) => {
                values.resize(values.len().max(self.encoder.num_vars()), false);
                trace!(assigned = values.len(), "SAT worker returned a model");
                self.model = Some(values);
                Ok(CheckResult::Sat)
            }
            Reply::Unsat => Ok(CheckResult::Unsat),
            Reply::Failed(message) => Err(SolverError::Backend(message)),
        }
    }

    fn value(&self, var: BoolVar) -> Option<bool> {
        let lit = self.encoder.var_literal(var).ok()?;
        self.model.as_ref()?.get(lit as usize - 1).copied()
    }
}

impl Drop for VarisatEngine {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            drop(worker.requests);
            let _ = worker.handle.join();
        }
    }
}
